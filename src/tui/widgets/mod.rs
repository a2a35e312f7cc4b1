pub mod header;
pub mod month_table;
pub mod prayer_cards;
pub mod statusbar;
pub mod sun_times;
