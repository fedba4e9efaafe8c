//! YAML definition -> model -> finalized model -> T-SQL

use std::io::Write;
use std::sync::Arc;

use relmodel::config::ModelBuildConfig;
use relmodel::metadata::{ModelDefinition, ModelError, ReadOnlyModel};
use relmodel::query::{
    translate_member_path, MemberTranslatorChain, QueryTranslationError,
    SqlServerTypeMappingSource, ToSql,
};
use tempfile::NamedTempFile;

const CADASTRE: &str = r#"
entities:
  - name: District
    primary_key: [Id]
    properties:
      - { name: Id, type: int }
      - { name: Name, type: string }
      - { name: Area, type: polygon, store_type: geography }
  - name: Parcel
    primary_key: [Id]
    properties:
      - { name: Id, type: int }
      - { name: DistrictId, type: int }
      - { name: Boundary, type: polygon }
    owned:
      - navigation: Survey
        name: SurveyPoint
        properties:
          - { name: Location, type: point, store_type: Geography }
foreign_keys:
  - dependent: Parcel
    principal: District
    properties: [DistrictId]
    navigation: District
    inverse_navigation: Parcels
ignored: [ParcelHistory]
annotations:
  Schema: cadastre
"#;

fn write_definition(yaml: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(yaml.as_bytes()).unwrap();
    file
}

fn translate(model: &dyn ReadOnlyModel, path: &str) -> Result<String, QueryTranslationError> {
    let source = Arc::new(SqlServerTypeMappingSource::new());
    let translators = MemberTranslatorChain::sql_server_spatial(source.clone());
    translate_member_path(model, path, source.as_ref(), &translators)?.to_sql()
}

#[test]
fn test_definition_file_to_sql() {
    let file = write_definition(CADASTRE);
    let definition = ModelDefinition::from_yaml_file(file.path()).unwrap();
    let model = definition
        .build(&ModelBuildConfig::default())
        .unwrap()
        .finalize_model()
        .unwrap()
        .unwrap();

    let cases = [
        ("District.Area.ExteriorRing", "[d].[Area].RingN(1)"),
        ("District.Area.NumInteriorRings", "([d].[Area].NumRings() - 1)"),
        ("Parcel.Boundary.ExteriorRing", "[p].[Boundary].STExteriorRing()"),
        ("Parcel.Boundary.NumInteriorRings", "[p].[Boundary].STNumInteriorRing()"),
        ("Parcel.Survey.Location.Y", "[p].[Location].Lat"),
        ("Parcel.District.Area.ExteriorRing", "[p].[Area].RingN(1)"),
    ];
    for (path, expected) in cases {
        assert_eq!(translate(&model, path).unwrap(), expected, "path {}", path);
    }
}

#[test]
fn test_default_spatial_store_type_from_config() {
    let file = write_definition(CADASTRE);
    let definition = ModelDefinition::from_yaml_file(file.path()).unwrap();
    let config = ModelBuildConfig {
        default_spatial_store_type: "geography".to_string(),
        ..Default::default()
    };
    let model = definition.build(&config).unwrap();

    // Boundary declares no store type, so it follows the configured default
    assert_eq!(
        translate(&model, "Parcel.Boundary.NumInteriorRings").unwrap(),
        "([p].[Boundary].NumRings() - 1)"
    );
}

#[test]
fn test_debug_view_of_built_model() {
    let definition = ModelDefinition::from_yaml_str(CADASTRE).unwrap();
    let model = definition.build(&ModelBuildConfig::default()).unwrap();
    let debug = model.to_debug_string();

    assert!(debug.starts_with("Model:\n  EntityType: District\n"));
    assert!(debug.contains("      Area (Polygon) [geography]\n"));
    assert!(debug.contains("      {'DistrictId'} -> District ToPrincipal: District ToDependent: Parcels\n"));
    assert!(debug.contains("  EntityType: Parcel.Survey#SurveyPoint\n"));
    assert!(debug.contains("      {'Id'} -> Parcel ToDependent: Survey Ownership\n"));
    assert!(debug.contains("    Schema: \"cadastre\"\n"));
    assert!(debug.contains("    ParcelHistory (explicit)\n"));
}

#[test]
fn test_untranslatable_member() {
    let yaml = r#"
entities:
  - name: Road
    primary_key: [Id]
    properties:
      - { name: Id, type: int }
      - { name: Path, type: linestring }
"#;
    let model = ModelDefinition::from_yaml_str(yaml)
        .unwrap()
        .build(&ModelBuildConfig::default())
        .unwrap();

    assert_eq!(
        translate(&model, "Road.Path.Count"),
        Err(QueryTranslationError::UntranslatableMember {
            member: "Count".to_string(),
            declaring_type: "LineString".to_string(),
        })
    );
}

#[test]
fn test_build_errors_surface_registry_errors() {
    let yaml = r#"
entities:
  - name: Parcel
    primary_key: [Id]
    properties:
      - { name: Id, type: int }
      - { name: Id, type: long }
"#;
    let error = ModelDefinition::from_yaml_str(yaml)
        .unwrap()
        .build(&ModelBuildConfig::default())
        .unwrap_err();
    assert_eq!(
        error,
        ModelError::DuplicateProperty {
            property: "Id".to_string(),
            entity_type: "Parcel".to_string(),
        }
    );
}
