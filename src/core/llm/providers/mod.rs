pub mod openai;

pub use openai::OpenAiAssistants;
