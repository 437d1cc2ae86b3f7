/// loader: Locate and parse the bootsync configuration file.
pub mod loader;
