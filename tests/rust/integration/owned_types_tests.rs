//! Owned types built from definitions, removed and re-added

use relmodel::config::ModelBuildConfig;
use relmodel::metadata::{ConfigurationSource, ModelDefinition, ModelError, Property};

const BLOGS: &str = r#"
entities:
  - name: Blog
    primary_key: [Id]
    properties:
      - { name: Id, type: int }
    owned:
      - navigation: Owner
        name: Person
        properties:
          - { name: Name, type: string }
        owned:
          - navigation: Home
            name: Address
            properties:
              - { name: Location, type: point }
  - name: Post
    primary_key: [Id]
    properties:
      - { name: Id, type: int }
    owned:
      - navigation: Author
        name: Person
"#;

#[test]
fn test_same_owned_type_under_two_owners() {
    let model = ModelDefinition::from_yaml_str(BLOGS)
        .unwrap()
        .build(&ModelBuildConfig::default())
        .unwrap();
    let blog = model.find_entity_type("Blog").unwrap();
    let post = model.find_entity_type("Post").unwrap();

    let owner = model.find_weak_entity_type("Person", "Owner", blog).unwrap();
    let author = model.find_weak_entity_type("Person", "Author", post).unwrap();

    assert_eq!(model.entity_types_named("Person"), vec![author, owner]);
    assert!(model.has_other_entity_types_with_defining_navigation(owner));
    assert!(model.entity_type_should_have_defining_navigation("Person"));
    assert_eq!(model.find_entity_type("Person"), None);
}

#[test]
fn test_removing_an_owner_and_rebuilding_it() {
    let mut model = ModelDefinition::from_yaml_str(BLOGS)
        .unwrap()
        .build(&ModelBuildConfig::default())
        .unwrap();
    let blog = model.find_entity_type("Blog").unwrap();
    let owner = model.find_weak_entity_type("Person", "Owner", blog).unwrap();
    let home = model.find_weak_entity_type("Address", "Home", owner).unwrap();

    // The ownership link keeps Person in place until it is dropped
    assert!(matches!(
        model.remove_entity_type_with_owned(owner),
        Err(ModelError::EntityTypeInUseByForeignKey { .. })
    ));
    let ownership = model.find_navigation(blog, "Owner").unwrap().foreign_key;
    model.remove_foreign_key(ownership).unwrap();
    model.remove_entity_type_with_owned(owner).unwrap();

    assert!(!model.entity_type(home).is_attached());
    assert_eq!(model.find_actual_entity_type(home), None);
    assert!(!model.has_entity_type_with_defining_navigation("Address"));

    // Rebuild the same shape by hand
    let new_owner = model
        .add_weak_entity_type("Person", "Owner", blog, ConfigurationSource::Explicit)
        .unwrap()
        .unwrap();
    model
        .add_property(new_owner, Property::new("BlogId"))
        .unwrap();
    let fk = model.add_foreign_key(new_owner, &["BlogId"], blog).unwrap();
    model.set_navigations(fk, None, Some("Owner"));
    model.set_is_ownership(fk, true);

    let new_home = model
        .add_weak_entity_type("Address", "Home", new_owner, ConfigurationSource::Explicit)
        .unwrap()
        .unwrap();
    model.add_property(new_home, Property::new("PersonId")).unwrap();
    let fk = model.add_foreign_key(new_home, &["PersonId"], new_owner).unwrap();
    model.set_navigations(fk, None, Some("Home"));

    assert_eq!(model.find_actual_entity_type(owner), Some(new_owner));
    assert_eq!(model.find_actual_entity_type(home), Some(new_home));
    assert!(model.finalize_model().unwrap().is_some());
}
