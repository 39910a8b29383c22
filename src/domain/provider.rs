use std::collections::HashSet;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProviderCategory {
    SpeechToText,
    Enhancement,
}

impl ProviderCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderCategory::SpeechToText => "speech_to_text",
            ProviderCategory::Enhancement => "enhancement",
        }
    }
}

impl fmt::Display for ProviderCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EngineKind {
    CloudWhisper,
    WhisperCpp,
    SenseVoice,
    OpenAiCompatible,
    AzureOpenAi,
    LocalServer,
}

impl EngineKind {
    pub fn category(&self) -> ProviderCategory {
        match self {
            EngineKind::CloudWhisper | EngineKind::WhisperCpp | EngineKind::SenseVoice => {
                ProviderCategory::SpeechToText
            }
            EngineKind::OpenAiCompatible | EngineKind::AzureOpenAi | EngineKind::LocalServer => {
                ProviderCategory::Enhancement
            }
        }
    }

    pub fn requires_local_slot(&self) -> bool {
        matches!(self, EngineKind::WhisperCpp | EngineKind::SenseVoice)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            EngineKind::CloudWhisper => "cloud_whisper",
            EngineKind::WhisperCpp => "whisper_cpp",
            EngineKind::SenseVoice => "sense_voice",
            EngineKind::OpenAiCompatible => "openai_compatible",
            EngineKind::AzureOpenAi => "azure_openai",
            EngineKind::LocalServer => "local_server",
        }
    }
}

impl FromStr for EngineKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "cloud_whisper" => Ok(EngineKind::CloudWhisper),
            "whisper_cpp" => Ok(EngineKind::WhisperCpp),
            "sense_voice" => Ok(EngineKind::SenseVoice),
            "openai_compatible" => Ok(EngineKind::OpenAiCompatible),
            "azure_openai" => Ok(EngineKind::AzureOpenAi),
            "local_server" => Ok(EngineKind::LocalServer),
            _ => Err(format!("Unknown engine kind: {}", s)),
        }
    }
}

impl fmt::Display for EngineKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AllowList {
    All,
    Members(HashSet<String>),
}

impl AllowList {
    pub fn permits(&self, user: &str) -> bool {
        match self {
            AllowList::All => true,
            AllowList::Members(members) => members.contains(user),
        }
    }

    pub fn is_open(&self) -> bool {
        matches!(self, AllowList::All)
    }
}

#[derive(Debug, Clone)]
pub struct ProviderDescriptor {
    pub name: String,
    pub kind: EngineKind,
    pub endpoint: Option<String>,
    pub api_key: Option<String>,
    pub model: Option<String>,
    pub binary_path: Option<PathBuf>,
    pub model_path: Option<PathBuf>,
    pub enabled: bool,
    pub access: AllowList,
}

impl ProviderDescriptor {
    pub fn category(&self) -> ProviderCategory {
        self.kind.category()
    }
}
