mod settings;

pub use settings::{
    AsrSettings, AuthSettings, DiarizationSettings, EnhancementSettings, Environment, JobSettings,
    LoggingSettings, ProviderSetting, ServerSettings, Settings, StaticToken, load_settings,
};
