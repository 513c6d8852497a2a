pub mod key;
pub mod record;
pub mod series;
pub mod site;
