//! Configuration management for Referat.

mod settings;

pub use settings::{
    ActionItemSettings, AssemblyAiSettings, GeminiSettings, GeneralSettings, JobSettings,
    Settings, SummarizationSettings, SupervisorSettings, TranscriptionProvider,
    TranscriptionSettings,
};
