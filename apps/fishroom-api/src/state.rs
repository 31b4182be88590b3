use std::sync::Arc;

use fishroom_broker::Broker;
use fishroom_bus::Bus;
use fishroom_stores::ApiClientRegistry;

pub struct AppState {
    pub ingress: Bus,
    pub api_clients: Arc<dyn ApiClientRegistry>,
    pub baseurl: String,
}

impl AppState {
    pub fn new(broker: Arc<dyn Broker>, prefix: &str, api_clients: Arc<dyn ApiClientRegistry>, baseurl: String) -> Self {
        AppState {
            ingress: Bus::new(broker, prefix, fishroom_bus::Direction::Ingress),
            api_clients,
            baseurl,
        }
    }
}
