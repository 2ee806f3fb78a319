use std::sync::Arc;

use nutrigpt_client::{NutritionChat, PlanGenerator};

use crate::cache::{Clock, PlanCache};
use crate::chat::ChatService;
use crate::middleware::LoggingGenerator;
use crate::profile::ProfileRepository;
use crate::progress::ProgressLog;
use crate::store::Store;

/// Everything the HTTP handlers need, sharing one store and one clock.
pub struct AppState {
    pub profiles: ProfileRepository,
    pub plans: Arc<PlanCache>,
    pub chat: ChatService,
    pub progress: ProgressLog,
}

impl AppState {
    pub fn new(
        store: Arc<dyn Store>,
        generator: Arc<dyn PlanGenerator>,
        chat: Arc<dyn NutritionChat>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let plans = Arc::new(PlanCache::new(store.clone(), generator, clock.clone()));
        Self {
            profiles: ProfileRepository::new(store.clone(), plans.clone()),
            chat: ChatService::new(chat, plans.clone()),
            progress: ProgressLog::new(store, clock),
            plans,
        }
    }

    /// Wire a single client that both generates plans and answers chat questions,
    /// wrapped in the logging/metrics middleware.
    pub fn with_client<G>(store: Arc<dyn Store>, client: G, clock: Arc<dyn Clock>) -> Self
    where
        G: PlanGenerator + NutritionChat,
    {
        let wrapped = Arc::new(LoggingGenerator::new(client));
        Self::new(store, wrapped.clone(), wrapped, clock)
    }
}
