//! Phonetic coding of names (Double Metaphone).
//!
//! The coder is a process-wide singleton initialized once. Hosts call
//! [`ensure_loaded`] (or [`install`]) before the first resolution; concurrent
//! first callers await the same in-flight initialization. Until it has
//! completed, [`phonetic_match`] answers `false` and [`phonetic_code`]
//! answers `None`, so scoring degrades instead of failing.

use rphonetic::{DoubleMetaphone, Encoder};
use tokio::sync::OnceCell;
use tracing::info;

use lore_core::error::{LoreError, LoreResult};

use crate::aliases::normalize_name_for_matching;

/// Word used to check that a freshly built encoder produces codes.
const PROBE_WORD: &str = "smith";

static CODER: OnceCell<PhoneticCoder> = OnceCell::const_new();

/// Primary-code phonetic encoder.
pub struct PhoneticCoder {
    encoder: DoubleMetaphone,
}

impl PhoneticCoder {
    /// Build the encoder and verify it produces codes.
    pub fn load() -> LoreResult<Self> {
        let encoder = DoubleMetaphone::default();
        if encoder.encode(PROBE_WORD).is_empty() {
            return Err(LoreError::phonetic(
                "Double Metaphone encoder produced an empty code for the probe word",
            ));
        }
        Ok(Self { encoder })
    }

    /// Primary Double Metaphone code of `text`.
    pub fn primary_code(&self, text: &str) -> String {
        self.encoder.encode(text)
    }
}

/// Initialize the shared coder if needed and return it.
///
/// A failed initialization is reported to every caller that awaited it;
/// the next call tries again.
pub async fn ensure_loaded() -> LoreResult<&'static PhoneticCoder> {
    CODER
        .get_or_try_init(|| async {
            let coder = PhoneticCoder::load()?;
            info!("Phonetic coder loaded");
            Ok::<_, LoreError>(coder)
        })
        .await
}

/// Install an already built coder. Returns `false` if one was already set.
pub fn install(coder: PhoneticCoder) -> bool {
    CODER.set(coder).is_ok()
}

/// The shared coder, if initialization has completed.
pub fn coder() -> Option<&'static PhoneticCoder> {
    CODER.get()
}

/// Whether the shared coder is ready.
pub fn is_loaded() -> bool {
    CODER.initialized()
}

/// Primary phonetic code of `text`, or `None` if the coder is not loaded
/// or produced no code.
pub fn phonetic_code(text: &str) -> Option<String> {
    let code = coder()?.primary_code(text);
    if code.is_empty() {
        None
    } else {
        Some(code)
    }
}

/// Whether two names share a primary phonetic code of at least two
/// characters, compared on their normalized forms.
///
/// Never fails: returns `false` while the coder is not loaded.
pub fn phonetic_match(a: &str, b: &str) -> bool {
    let Some(coder) = coder() else {
        return false;
    };

    let code_a = coder.primary_code(&normalize_name_for_matching(a));
    let code_b = coder.primary_code(&normalize_name_for_matching(b));

    code_a.len() >= 2 && code_a == code_b
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_ensure_loaded_is_shared() {
        let (first, second) = tokio::join!(ensure_loaded(), ensure_loaded());
        let first = first.unwrap();
        let second = second.unwrap();
        assert!(std::ptr::eq(first, second));
        assert!(is_loaded());
        // A second install is rejected once loaded
        assert!(!install(PhoneticCoder::load().unwrap()));
    }

    #[tokio::test]
    async fn test_phonetic_match_spelling_variants() {
        ensure_loaded().await.unwrap();

        assert!(phonetic_match("Dracula", "Drakula"));
        assert!(phonetic_match("Catherine", "Katherine"));
        assert!(!phonetic_match("Dracula", "Harker"));
    }

    #[tokio::test]
    async fn test_phonetic_code() {
        ensure_loaded().await.unwrap();

        assert_eq!(phonetic_code("dracula"), phonetic_code("drakula"));
        assert!(phonetic_code("").is_none());
    }

    #[test]
    fn test_load_produces_codes() {
        let coder = PhoneticCoder::load().unwrap();
        assert!(!coder.primary_code("harry").is_empty());
    }
}
