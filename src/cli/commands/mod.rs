mod init;
mod load;

pub use init::cmd_init;
pub use load::{cmd_load_ingredients, cmd_load_tags};
