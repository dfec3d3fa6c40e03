pub mod devices;
pub mod memory;
pub mod readings;
pub mod users;

use std::sync::Arc;

use crate::db::DbPool;
use crate::error::Result;

pub use devices::{Device, DeviceRegistry, NewDevice, PgDeviceRepository};
pub use memory::MemoryStore;
pub use readings::{NewReading, PgReadingRepository, Reading, ReadingStore};
pub use users::{NewUser, PgUserRepository, User, UserStore};

#[derive(Debug, Clone)]
enum Backend {
    Postgres(DbPool),
    Memory,
}

/// Store handles shared by every request.
#[derive(Clone)]
pub struct Stores {
    pub readings: Arc<dyn ReadingStore>,
    pub devices: Arc<dyn DeviceRegistry>,
    pub users: Arc<dyn UserStore>,
    backend: Backend,
}

impl Stores {
    pub fn postgres(pool: DbPool) -> Self {
        Self {
            readings: Arc::new(PgReadingRepository::new(pool.clone())),
            devices: Arc::new(PgDeviceRepository::new(pool.clone())),
            users: Arc::new(PgUserRepository::new(pool.clone())),
            backend: Backend::Postgres(pool),
        }
    }

    pub fn memory() -> Self {
        let store = Arc::new(MemoryStore::new());
        Self {
            readings: store.clone(),
            devices: store.clone(),
            users: store,
            backend: Backend::Memory,
        }
    }

    pub fn backend_name(&self) -> &'static str {
        match self.backend {
            Backend::Postgres(_) => "postgres",
            Backend::Memory => "memory",
        }
    }

    /// Round-trip to the backing database, if there is one.
    pub async fn ping(&self) -> Result<()> {
        if let Backend::Postgres(pool) = &self.backend {
            sqlx::query("SELECT 1").execute(pool).await?;
        }
        Ok(())
    }
}
