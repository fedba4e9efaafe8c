//! Display names of classes and of entity types in the registry

use std::sync::Arc;
use std::thread;

use relmodel::metadata::clr_type::primitives::{INT32, STRING};
use relmodel::metadata::type_identity::DisplayNameCache;
use relmodel::metadata::{ClrType, ConfigurationSource, Model, TypeRef};

#[test]
fn test_cache_is_shared_across_threads() {
    let cache = Arc::new(DisplayNameCache::new());
    let list = ClrType::builder("System.Collections.Generic", "List`1")
        .generic_argument(&STRING)
        .build();

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let cache = Arc::clone(&cache);
            let list = list.clone();
            thread::spawn(move || cache.get_or_add(&list).to_string())
        })
        .collect();

    for handle in handles {
        assert_eq!(
            handle.join().unwrap(),
            "System.Collections.Generic.List<string>"
        );
    }
    assert_eq!(cache.len(), 1);
}

#[test]
fn test_name_and_class_inputs_resolve_alike() {
    let cache = DisplayNameCache::new();
    let order = ClrType::new("Shop", "Order");

    let by_class = cache.resolve(&TypeRef::from(&order));
    let by_name = cache.resolve(&TypeRef::from("Shop.Order"));

    assert_eq!(by_class.name(), by_name.name());
    assert_eq!(by_class.short_display_name(), "Order");
    assert_eq!(by_name.short_display_name(), "Shop.Order");
    assert!(by_name.clr_type().is_none());
}

#[test]
fn test_registry_display_names() {
    let mut model = Model::new();
    let map = ClrType::builder("System.Collections.Generic", "Dictionary`2")
        .generic_argument(&STRING)
        .generic_argument(&INT32)
        .build();
    let order = ClrType::new("Shop", "Order");

    let bag = model
        .add_entity_type(&map, ConfigurationSource::Convention)
        .unwrap()
        .unwrap();
    let order_id = model
        .add_entity_type(&order, ConfigurationSource::Explicit)
        .unwrap()
        .unwrap();
    let clash = model
        .add_weak_entity_type(&map, "Details", order_id, ConfigurationSource::Explicit)
        .unwrap_err();

    assert_eq!(model.display_name(bag), "Dictionary<string, int>");
    assert_eq!(model.display_name(order_id), "Order");
    assert!(clash
        .to_string()
        .contains("'Order.Details#Dictionary<string, int>'"));
    assert_eq!(
        model.find_entity_type("System.Collections.Generic.Dictionary<string, int>"),
        Some(bag)
    );
}
