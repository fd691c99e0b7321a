mod address_bar;
mod controller;
pub mod display;
mod source;
mod widget;

pub use address_bar::{AddressBar, MemoryAddressBar};
pub use controller::DashboardController;
pub use display::DisplayView;
pub use source::{AnalyticsSource, LocalSource};
pub use widget::{DashboardView, Widget, WidgetStatus};
