use crate::core::config::data::path_display;
use crate::core::config::defaults::Settings;

impl Settings {
    pub fn print_all(&self) {
        println!("Current configuration:");
        println!("  api-url: {}", self.api_url);
        println!("  storage-key: {}", self.storage_key);
        println!("  max-history-items: {}", self.max_history_items);
        println!("  request-timeout: {} ms", self.request_timeout.as_millis());
        println!("  typing-delay: {} ms", self.typing_delay.as_millis());
        match &self.theme {
            Some(theme) => println!("  theme: {theme}"),
            None => println!("  theme: (unset)"),
        }
        match &self.data_dir {
            Some(dir) => println!("  data-dir: {}", path_display(dir)),
            None => println!("  data-dir: (platform default)"),
        }
    }
}
