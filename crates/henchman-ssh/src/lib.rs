pub mod ssh_runner;

pub use ssh_runner::SshRunner;
