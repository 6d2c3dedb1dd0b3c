//! 持久化

mod memory;
mod migrations;
mod postgres_identity_repository;
mod postgres_unit_of_work;
mod queries;
mod tx_repositories;

pub use memory::InMemoryStore;
pub use migrations::run_migrations;
pub use postgres_identity_repository::PostgresIdentityRepository;
pub use postgres_unit_of_work::{PostgresUnitOfWork, PostgresUnitOfWorkFactory};
