//! Demonstration presets: what distinguishes one controller run from another.

use threadloop_config::AppConfig;
use threadloop_core::message::{Message, Thread};
use threadloop_core::store::DemoId;
use threadloop_core::tool::ToolRegistry;

/// System preamble, initial request and tool set for one demonstration.
#[derive(Debug, Clone)]
pub struct DemoPreset {
    pub demo: DemoId,

    /// Seeds the thread of an autonomous run
    pub system_preamble: Option<String>,

    /// The request an autonomous run starts from
    pub initial_request: Option<String>,

    /// First step recorded by an autonomous run
    pub opening_step: Option<String>,

    /// Artifact slots that must all be filled for the run to count as a success
    pub required_slots: Vec<String>,

    /// Final step recorded once `required_slots` are filled
    pub success_message: Option<String>,
}

impl DemoPreset {
    /// Interactive tool calling over a persisted thread.
    pub fn tool_conversation() -> Self {
        Self {
            demo: DemoId::Section3,
            system_preamble: None,
            initial_request: None,
            opening_step: None,
            required_slots: Vec::new(),
            success_message: None,
        }
    }

    /// The autonomous meme workflow: fetch a joke, then draw it.
    pub fn meme_agent() -> Self {
        Self {
            demo: DemoId::Section4,
            system_preamble: Some(
                "You are a helpful assistant that creates programming memes. \
                 First fetch a joke, then generate a creative meme image for it."
                    .into(),
            ),
            initial_request: Some(
                "Create a programming meme for me! Fetch a joke and generate a funny meme image."
                    .into(),
            ),
            opening_step: Some("Starting agent workflow: Fetch joke → Generate meme image".into()),
            required_slots: vec!["joke".into(), "image_url".into()],
            success_message: Some("Successfully created programming meme!".into()),
        }
    }

    /// The thread an autonomous run starts from.
    pub fn seed_thread(&self) -> Thread {
        let mut thread = Thread::new();
        if let Some(preamble) = &self.system_preamble {
            thread.append(Message::system(preamble));
        }
        if let Some(request) = &self.initial_request {
            thread.append(Message::user(request));
        }
        thread
    }

    /// The tools this demonstration exposes to the model.
    pub fn registry(&self, config: &AppConfig) -> ToolRegistry {
        match self.demo {
            DemoId::Section4 => threadloop_tools::meme_registry(config),
            DemoId::Section2 | DemoId::Section3 => threadloop_tools::conversation_registry(config),
        }
    }
}
