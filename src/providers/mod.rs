pub mod monobank;
pub mod svg;
pub mod telegram;

pub use monobank::MonobankSource;
pub use svg::SvgRenderer;
pub use telegram::TelegramNotifier;
