use super::*;
use shared::error::{AppError, ErrorCode};

mod test_core;

fn create_test_manager() -> OrdersManager {
    let storage = OrderStorage::open_in_memory().unwrap();
    OrdersManager::with_storage(storage)
}

fn create_manager_with_policy(policy: StatusPolicy) -> OrdersManager {
    let storage = OrderStorage::open_in_memory().unwrap();
    OrdersManager::new(storage, EventBroadcaster::new(), policy)
}

fn customer(id: &str) -> Identity {
    Identity {
        id: id.to_string(),
        email: format!("{id}@example.com"),
        name: format!("Customer {id}"),
        role: Role::Customer,
    }
}

fn courier(id: &str) -> Identity {
    Identity {
        id: id.to_string(),
        email: format!("{id}@example.com"),
        name: format!("Courier {id}"),
        role: Role::Delivery,
    }
}

fn pizza_input() -> CreateOrderInput {
    CreateOrderInput {
        product: "Pizza".to_string(),
        quantity: 2,
        location: "12 Main St".to_string(),
    }
}

fn place_order(manager: &OrdersManager, customer_id: &str) -> Order {
    manager
        .create(pizza_input(), &customer(customer_id))
        .expect("create order")
}

fn error_code(err: ManagerError) -> ErrorCode {
    AppError::from(err).code
}
