//! System commands, fuzzy matched against the query text

use async_trait::async_trait;
use wox_core::error::Result;
use wox_core::matcher::StringMatcher;
use wox_core::{impl_plugin_factory, Plugin, PluginMetadata, Query, ResultAction, ResultItem};

pub const SYSTEM_PLUGIN_ID: &str = "system";

struct SystemCommand {
    key: &'static str,
    title: &'static str,
    subtitle: &'static str,
    shell: &'static str,
}

const COMMANDS: &[SystemCommand] = &[
    SystemCommand {
        key: "lock",
        title: "Lock Computer",
        subtitle: "Lock the current session",
        shell: "loginctl lock-session",
    },
    SystemCommand {
        key: "sleep",
        title: "Sleep",
        subtitle: "Suspend the computer",
        shell: "systemctl suspend",
    },
    SystemCommand {
        key: "restart",
        title: "Restart",
        subtitle: "Restart the computer",
        shell: "systemctl reboot",
    },
    SystemCommand {
        key: "shutdown",
        title: "Shutdown",
        subtitle: "Power off the computer",
        shell: "systemctl poweroff",
    },
    SystemCommand {
        key: "logout",
        title: "Log Out",
        subtitle: "End the current session",
        shell: "loginctl terminate-session self",
    },
    SystemCommand {
        key: "trash",
        title: "Empty Trash",
        subtitle: "Permanently delete trashed files",
        shell: "gio trash --empty",
    },
];

/// Commands are only printed; running them from a terminal demo is unwanted
pub struct SystemCommandsPlugin {
    metadata: PluginMetadata,
    matcher: StringMatcher,
}

impl SystemCommandsPlugin {
    pub fn new() -> Self {
        Self {
            metadata: PluginMetadata::new(SYSTEM_PLUGIN_ID, "System Commands")
                .with_author("Wox Launcher")
                .with_description("Lock, sleep, restart and other system commands"),
            matcher: StringMatcher::default(),
        }
    }
}

impl Default for SystemCommandsPlugin {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Plugin for SystemCommandsPlugin {
    fn metadata(&self) -> &PluginMetadata {
        &self.metadata
    }

    async fn query(&self, query: &Query) -> Result<Vec<ResultItem>> {
        if query.search().is_empty() {
            return Ok(Vec::new());
        }

        let results = COMMANDS
            .iter()
            .filter_map(|command| {
                let matched = self.matcher.fuzzy_match(query.search(), command.title);
                if !matched.is_search_precision_met() {
                    return None;
                }
                let shell = command.shell;
                Some(
                    ResultItem::new(command.title)
                        .with_subtitle(command.subtitle)
                        .with_context_data(command.key)
                        .with_score(matched.score())
                        .with_title_highlights(matched.highlights())
                        .with_action(ResultAction::new("Execute", move |_| {
                            println!("Would run: {}", shell);
                            true
                        })),
                )
            })
            .collect();

        Ok(results)
    }
}

impl_plugin_factory!(
    SystemCommandsFactory,
    SystemCommandsPlugin::new(),
    SYSTEM_PLUGIN_ID,
    "System Commands"
);
