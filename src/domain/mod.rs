// Domain layer: the build record schema and the identity port shared by
// records and easystack entries.

pub mod model;
pub mod ports;
