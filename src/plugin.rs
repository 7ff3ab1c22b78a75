use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info};

use crate::platform::EventContext;

/// Registration metadata of a plugin.
#[derive(Debug, Clone)]
pub struct PluginMeta {
    pub name: &'static str,
    /// Higher runs first.
    pub priority: i32,
    pub hidden: bool,
    pub enabled: bool,
    pub desc: &'static str,
    pub version: &'static str,
    pub author: &'static str,
}

/// A message handler the host runs for every inbound event.
#[async_trait]
pub trait Plugin: Send + Sync {
    fn meta(&self) -> &PluginMeta;

    fn help_text(&self, verbose: bool) -> String;

    /// Inspect the event and optionally set a reply and an action on it.
    async fn on_handle_context(&self, event: &mut EventContext);
}

/// Registered plugins, ordered by descending priority.
#[derive(Default)]
pub struct PluginChain {
    plugins: Vec<Arc<dyn Plugin>>,
}

impl PluginChain {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a plugin. Disabled plugins are dropped; plugins with equal
    /// priority keep registration order.
    pub fn register(&mut self, plugin: Arc<dyn Plugin>) {
        let meta = plugin.meta();
        if !meta.enabled {
            info!("Plugin {} is disabled, not registering", meta.name);
            return;
        }

        info!(
            "Registered plugin: {} v{} - {} (priority {})",
            meta.name, meta.version, meta.desc, meta.priority
        );
        let pos = self
            .plugins
            .iter()
            .position(|p| p.meta().priority < meta.priority)
            .unwrap_or(self.plugins.len());
        self.plugins.insert(pos, plugin);
    }

    /// Help for every visible plugin, one block per plugin.
    pub fn help(&self, verbose: bool) -> String {
        self.plugins
            .iter()
            .filter(|p| !p.meta().hidden)
            .map(|p| {
                let meta = p.meta();
                format!(
                    "[{}] v{} by {}\n{}",
                    meta.name,
                    meta.version,
                    meta.author,
                    p.help_text(verbose)
                )
            })
            .collect::<Vec<_>>()
            .join("\n\n")
    }

    /// Run the event through the chain until a plugin stops it.
    pub async fn dispatch(&self, event: &mut EventContext) {
        for plugin in &self.plugins {
            plugin.on_handle_context(event).await;
            if event.action.stops_chain() {
                debug!(
                    "Plugin {} stopped the chain with {:?}",
                    plugin.meta().name,
                    event.action
                );
                break;
            }
        }
    }

    pub fn len(&self) -> usize {
        self.plugins.len()
    }

    #[allow(dead_code)]
    pub fn is_empty(&self) -> bool {
        self.plugins.is_empty()
    }
}
