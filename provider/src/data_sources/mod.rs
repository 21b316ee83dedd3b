mod build_configuration;
mod server;

pub use build_configuration::{
    BuildConfigurationConfig, BuildConfigurationDataSource, BuildConfigurationModel,
};
pub use server::{ServerDataSource, ServerModel};
