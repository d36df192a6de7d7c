// Domain layer: data model of the habitat split and the ports the pipeline is wired through.

pub mod model;
pub mod ports;
