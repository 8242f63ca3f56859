use super::*;

#[test]
fn test_create_order() {
    let manager = create_test_manager();
    let order = place_order(&manager, "c-1");

    assert_eq!(order.status, OrderStatus::Pending);
    assert_eq!(order.customer_id, "c-1");
    assert!(order.delivery_partner_id.is_none());
    assert_eq!(order.quantity, 2);
    assert_eq!(order.created_at, order.updated_at);

    let stored = manager.get_by_id(&order.id).unwrap();
    assert_eq!(stored, Some(order));
}

#[test]
fn test_create_trims_fields() {
    let manager = create_test_manager();
    let input = CreateOrderInput {
        product: "  Sushi ".to_string(),
        quantity: 1,
        location: "\t5 Harbour Rd  ".to_string(),
    };
    let order = manager.create(input, &customer("c-1")).unwrap();
    assert_eq!(order.product, "Sushi");
    assert_eq!(order.location, "5 Harbour Rd");
}

#[test]
fn test_only_customers_create() {
    let manager = create_test_manager();
    let err = manager.create(pizza_input(), &courier("d-1")).unwrap_err();

    assert_eq!(error_code(err), ErrorCode::PermissionDenied);
    assert_eq!(manager.storage().get_current_sequence().unwrap(), 0);
}

#[test]
fn test_create_rejects_blank_input() {
    let manager = create_test_manager();
    let cases = [
        CreateOrderInput {
            product: "   ".to_string(),
            ..pizza_input()
        },
        CreateOrderInput {
            location: String::new(),
            ..pizza_input()
        },
        CreateOrderInput {
            quantity: 0,
            ..pizza_input()
        },
    ];

    for input in cases {
        let err = manager.create(input, &customer("c-1")).unwrap_err();
        assert_eq!(error_code(err), ErrorCode::ValidationFailed);
    }
    assert!(manager.customer_orders(&customer("c-1")).unwrap().is_empty());
}

#[test]
fn test_accept_sets_partner() {
    let manager = create_test_manager();
    let order = place_order(&manager, "c-1");

    let accepted = manager
        .update_status(&order.id, OrderStatus::Accepted, &courier("d-1"))
        .unwrap();

    assert_eq!(accepted.status, OrderStatus::Accepted);
    assert_eq!(accepted.delivery_partner_id.as_deref(), Some("d-1"));
    assert!(accepted.updated_at >= order.updated_at);
    assert_eq!(manager.get_by_id(&order.id).unwrap(), Some(accepted));
}

#[test]
fn test_only_couriers_update() {
    let manager = create_test_manager();
    let order = place_order(&manager, "c-1");

    let err = manager
        .update_status(&order.id, OrderStatus::Accepted, &customer("c-1"))
        .unwrap_err();
    assert_eq!(error_code(err), ErrorCode::PermissionDenied);

    let stored = manager.get_by_id(&order.id).unwrap().unwrap();
    assert_eq!(stored.status, OrderStatus::Pending);
}

#[test]
fn test_update_missing_order() {
    let manager = create_test_manager();
    let err = manager
        .update_status("no-such-order", OrderStatus::Accepted, &courier("d-1"))
        .unwrap_err();
    assert!(matches!(err, ManagerError::OrderNotFound(ref id) if id == "no-such-order"));
    assert_eq!(error_code(err), ErrorCode::OrderNotFound);
}

#[test]
fn test_linear_policy_rejects_skips() {
    let manager = create_test_manager();
    let order = place_order(&manager, "c-1");

    let err = manager
        .update_status(&order.id, OrderStatus::Delivered, &courier("d-1"))
        .unwrap_err();
    assert!(matches!(
        err,
        ManagerError::InvalidTransition {
            from: OrderStatus::Pending,
            to: OrderStatus::Delivered
        }
    ));
    assert_eq!(error_code(err), ErrorCode::InvalidStatusTransition);

    let stored = manager.get_by_id(&order.id).unwrap().unwrap();
    assert_eq!(stored, order);
}

#[test]
fn test_reaccept_keeps_first_partner() {
    let manager = create_test_manager();
    let order = place_order(&manager, "c-1");
    manager
        .update_status(&order.id, OrderStatus::Accepted, &courier("d-1"))
        .unwrap();

    let err = manager
        .update_status(&order.id, OrderStatus::Accepted, &courier("d-2"))
        .unwrap_err();
    assert_eq!(error_code(err), ErrorCode::InvalidStatusTransition);

    let stored = manager.get_by_id(&order.id).unwrap().unwrap();
    assert_eq!(stored.delivery_partner_id.as_deref(), Some("d-1"));
}

#[test]
fn test_unrestricted_reaccept_is_noop_for_partner() {
    let manager = create_manager_with_policy(StatusPolicy::Unrestricted);
    let order = place_order(&manager, "c-1");
    manager
        .update_status(&order.id, OrderStatus::Accepted, &courier("d-1"))
        .unwrap();

    let again = manager
        .update_status(&order.id, OrderStatus::Accepted, &courier("d-2"))
        .unwrap();
    assert_eq!(again.delivery_partner_id.as_deref(), Some("d-1"));
    assert_eq!(
        manager.delivery_orders(&courier("d-2")).unwrap(),
        Vec::<Order>::new()
    );
}

#[test]
fn test_unrestricted_allows_any_jump() {
    let manager = create_manager_with_policy(StatusPolicy::Unrestricted);
    let order = place_order(&manager, "c-1");

    let delivered = manager
        .update_status(&order.id, OrderStatus::Delivered, &courier("d-1"))
        .unwrap();
    assert_eq!(delivered.status, OrderStatus::Delivered);
    assert!(delivered.delivery_partner_id.is_none());

    let back = manager
        .update_status(&order.id, OrderStatus::Pending, &courier("d-1"))
        .unwrap();
    assert_eq!(back.status, OrderStatus::Pending);
    assert_eq!(
        manager.pending_orders(&courier("d-1")).unwrap(),
        vec![back]
    );
}

#[test]
fn test_listings_are_role_scoped() {
    let manager = create_test_manager();
    place_order(&manager, "c-1");

    assert_eq!(
        error_code(manager.customer_orders(&courier("d-1")).unwrap_err()),
        ErrorCode::PermissionDenied
    );
    for result in [
        manager.delivery_orders(&customer("c-1")),
        manager.pending_orders(&customer("c-1")),
        manager.orders_by_status(OrderStatus::Accepted, &customer("c-1")),
    ] {
        assert_eq!(error_code(result.unwrap_err()), ErrorCode::PermissionDenied);
    }
}

#[test]
fn test_listings_newest_first() {
    let manager = create_test_manager();
    let first = place_order(&manager, "c-1");
    let other = place_order(&manager, "c-2");
    let second = place_order(&manager, "c-1");

    let mine: Vec<_> = manager
        .customer_orders(&customer("c-1"))
        .unwrap()
        .into_iter()
        .map(|o| o.id)
        .collect();
    assert_eq!(mine, [second.id.clone(), first.id.clone()]);

    let pending: Vec<_> = manager
        .pending_orders(&courier("d-1"))
        .unwrap()
        .into_iter()
        .map(|o| o.id)
        .collect();
    assert_eq!(pending, [second.id, other.id, first.id]);
}

#[test]
fn test_get_by_id_missing() {
    let manager = create_test_manager();
    assert_eq!(manager.get_by_id("nothing").unwrap(), None);
}
