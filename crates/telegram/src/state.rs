use std::sync::Arc;

use printrelay_print::PrintOrchestrator;

use crate::download::TelegramFileSource;

/// Everything an update handler needs; cheap to clone into a task.
#[derive(Clone)]
pub struct RelayContext {
    pub bot: teloxide::Bot,
    pub orchestrator: Arc<PrintOrchestrator>,
    pub files: Arc<TelegramFileSource>,
}

impl RelayContext {
    pub fn new(bot: teloxide::Bot, orchestrator: Arc<PrintOrchestrator>) -> Self {
        let files = Arc::new(TelegramFileSource::new(bot.clone()));
        Self {
            bot,
            orchestrator,
            files,
        }
    }
}
