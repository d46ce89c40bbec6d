use std::fmt;

use serde::{Deserialize, Serialize};

/// One step of the voice pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Stage {
    Stt,
    Generate,
    Tts,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Stt => "STT",
            Self::Generate => "GENERATE",
            Self::Tts => "TTS",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_wire_names() {
        assert_eq!(serde_json::to_string(&Stage::Stt).unwrap(), r#""STT""#);
        assert_eq!(
            serde_json::to_string(&Stage::Generate).unwrap(),
            r#""GENERATE""#
        );
        assert_eq!(serde_json::to_string(&Stage::Tts).unwrap(), r#""TTS""#);
        assert_eq!(Stage::Generate.to_string(), "GENERATE");
    }
}
