//! Money transfer wired through the Khazna container.
//!
//! Run with `RUST_LOG=debug cargo run --example bank`.

use std::sync::Arc;

use khazna::prelude::*;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

// === Data access ===

mod dao {
    use std::collections::HashMap;

    use khazna::prelude::*;
    use parking_lot::Mutex;

    pub trait AccountDao: Send + Sync {
        fn balance(&self, card: &str) -> Result<i64, BoxError>;
        fn update(&self, card: &str, balance: i64) -> Result<(), BoxError>;
    }

    #[derive(Service)]
    #[service(
        name = "accountDao",
        implements(AccountDao),
        constructor = "InMemoryAccountDao::seeded"
    )]
    pub struct InMemoryAccountDao {
        accounts: Mutex<HashMap<String, i64>>,
    }

    impl InMemoryAccountDao {
        fn seeded() -> Result<Self, BoxError> {
            let accounts = HashMap::from([("alice".to_string(), 1_000), ("bob".to_string(), 500)]);
            Ok(Self {
                accounts: Mutex::new(accounts),
            })
        }
    }

    impl AccountDao for InMemoryAccountDao {
        fn balance(&self, card: &str) -> Result<i64, BoxError> {
            self.accounts
                .lock()
                .get(card)
                .copied()
                .ok_or_else(|| format!("unknown card {card}").into())
        }

        fn update(&self, card: &str, balance: i64) -> Result<(), BoxError> {
            self.accounts.lock().insert(card.to_string(), balance);
            Ok(())
        }
    }
}

// === Transactions ===

mod tx {
    use khazna::prelude::*;
    use tracing::info;

    #[derive(Default, Service)]
    #[service(name = "TransactionManager", implements(TransactionManager))]
    pub struct LoggingTransactionManager;

    impl TransactionManager for LoggingTransactionManager {
        fn begin(&self) -> Result<(), BoxError> {
            info!("BEGIN");
            Ok(())
        }

        fn commit(&self) -> Result<(), BoxError> {
            info!("COMMIT");
            Ok(())
        }

        fn rollback(&self) -> Result<(), BoxError> {
            info!("ROLLBACK");
            Ok(())
        }
    }
}

// === Services ===

mod service {
    use std::sync::Arc;

    use khazna::prelude::*;

    use crate::dao::AccountDao;

    pub trait TransferService: Send + Sync {
        fn transfer(&self, from: &str, to: &str, amount: i64) -> Result<(), BoxError>;
    }

    impl TransferService for Transactional<dyn TransferService> {
        fn transfer(&self, from: &str, to: &str, amount: i64) -> Result<(), BoxError> {
            self.invoke(|svc| svc.transfer(from, to, amount))
        }
    }

    impl Interface for dyn TransferService {
        fn proxy(target: Arc<Self>, manager: Arc<dyn TransactionManager>) -> Arc<Self> {
            Arc::new(Transactional::new(target, manager))
        }
    }

    #[derive(Default, Service)]
    #[service(name = "transferService", transactional, implements(TransferService))]
    pub struct TransferServiceImpl {
        #[autowired(name = "accountDao")]
        account_dao: Autowired<dyn AccountDao>,
    }

    impl TransferService for TransferServiceImpl {
        fn transfer(&self, from: &str, to: &str, amount: i64) -> Result<(), BoxError> {
            let dao = self.account_dao.get().ok_or("account dao is not wired")?;

            let from_balance = dao.balance(from)?;
            let to_balance = dao.balance(to)?;

            if from_balance < amount {
                return Err(format!("{from} cannot cover {amount}").into());
            }
            dao.update(from, from_balance - amount)?;
            dao.update(to, to_balance + amount)
        }
    }
}

fn build_container() -> khazna::Result<Container> {
    Container::builder()
        .scan("bank")
        .register::<TransactionalProxyFactory>()
        .build()
}

fn main() -> Result<(), BoxError> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let container = build_container()?;

    println!("{}", container.describe());

    let transfers: Arc<dyn service::TransferService> = container
        .lookup_as("transferService")
        .ok_or("transferService is not registered")?;
    let accounts: Arc<dyn dao::AccountDao> = container
        .lookup_as("accountDao")
        .ok_or("accountDao is not registered")?;

    transfers.transfer("alice", "bob", 100)?;
    info!(
        alice = accounts.balance("alice")?,
        bob = accounts.balance("bob")?,
        "Transfer committed"
    );

    if let Err(err) = transfers.transfer("bob", "alice", 10_000) {
        error!(error = %err, "Transfer rolled back");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transfer_moves_funds_and_rejects_overdraft() {
        let container = build_container().unwrap();

        let bean = container.lookup("transferService").unwrap();
        assert_eq!(bean.kind(), BeanKind::InterfaceProxy);

        let transfers: Arc<dyn service::TransferService> =
            container.lookup_as("transferService").unwrap();
        let accounts: Arc<dyn dao::AccountDao> = container.lookup_as("accountDao").unwrap();

        transfers.transfer("alice", "bob", 100).unwrap();
        assert_eq!(accounts.balance("alice").unwrap(), 900);
        assert_eq!(accounts.balance("bob").unwrap(), 600);

        assert!(transfers.transfer("bob", "alice", 10_000).is_err());
        assert_eq!(accounts.balance("bob").unwrap(), 600);
    }
}
