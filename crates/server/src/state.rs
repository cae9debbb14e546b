use adapter::CommandEnvelope;
use tokio::sync::mpsc;

#[derive(Clone)]
pub struct AppState {
    pub sender: mpsc::Sender<CommandEnvelope>,
    pub trigger_token: String,
}
