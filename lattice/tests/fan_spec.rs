//! End-to-end translation of a fan assembly schema.

use lattice::prelude::*;
use std::sync::Arc;

const FAN_SCHEMA: &str = r#"
Schema:
  Object Type: "Meta"
  Title: "Fan Assembly"
  Version: "1.0.0"
  Description: "Schema for fan assemblies"
  Root Data Group: "Performance"
SpeedControlType:
  Object Type: "Enumeration"
  Enumerators:
    DISCRETE:
      Description: "Discrete number of fan speeds"
      Display Text: "Discrete"
    CONTINUOUS:
      Description: "Continuously variable fan speed"
      Display Text: "Continuous"
PerformanceMapTemplate:
  Object Type: "Data Group Template"
GridVariablesTemplate:
  Object Type: "Data Group Template"
LookupVariablesTemplate:
  Object Type: "Data Group Template"
Performance:
  Object Type: "Data Group"
  Data Elements:
    operation_speed_control_type:
      Description: "Type of performance map"
      Data Type: "<SpeedControlType>"
      Required: true
    efficiency:
      Description: "Motor efficiency at each speed"
      Data Type: "[Numeric]"
      Units: "-"
      Constraints: [">=0.0", "<=1.0", "[1..]"]
      Required: true
    performance_map:
      Description: "Data group describing fan assembly performance"
      Data Type: "({PerformanceMapContinuous}, {PerformanceMapDiscrete})"
      Constraints: "operation_speed_control_type(CONTINUOUS, DISCRETE)"
      Required: true
PerformanceMapContinuous:
  Object Type: "Data Group"
  Data Group Template: "PerformanceMapTemplate"
  Data Elements:
    grid_variables:
      Data Type: "{GridVariablesContinuous}"
      Required: true
    lookup_variables:
      Data Type: "{LookupVariablesContinuous}"
      Required: true
PerformanceMapDiscrete:
  Object Type: "Data Group"
  Data Group Template: "PerformanceMapTemplate"
  Data Elements:
    speed_count:
      Data Type: "Integer"
GridVariablesContinuous:
  Object Type: "Data Group"
  Data Group Template: "GridVariablesTemplate"
  Data Elements:
    standard_air_volumetric_flow_rate:
      Data Type: "[Numeric]"
      Units: "m3/s"
    static_pressure_difference:
      Data Type: "[Numeric]"
      Units: "Pa"
LookupVariablesContinuous:
  Object Type: "Data Group"
  Data Group Template: "LookupVariablesTemplate"
  Data Elements:
    shaft_power:
      Data Type: "[Numeric]"
      Units: "W"
    impeller_rotational_speed:
      Data Type: "[Numeric]"
      Units: "rev/s"
"#;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn stock_session() -> CompilationSession {
    let registry = ExtensionRegistry::builder().with_stock_extensions().build();
    CompilationSession::new(GeneratorOptions::default()).with_extensions(Arc::new(registry))
}

fn generate_fan() -> GeneratedCode {
    init_tracing();
    generate_from_yaml(FAN_SCHEMA, "fan", &[], &stock_session()).expect("Failed to generate")
}

fn position(text: &str, needle: &str) -> usize {
    text.find(needle)
        .unwrap_or_else(|| panic!("'{needle}' not found"))
}

#[test]
fn test_enumeration_has_unknown_sentinel() {
    let code = generate_fan();
    let header = &code.header;

    assert!(header.contains("enum class SpeedControlType {\n\t\t\tDISCRETE,\n\t\t\tCONTINUOUS,\n\t\t\tUNKNOWN\n\t\t};"));
    let table = &header[position(header, "SpeedControlType_info {")..];
    let table = &table[..position(table, "};")];
    assert_eq!(table.matches("{SpeedControlType::").count(), 3);
    assert!(header.contains("{SpeedControlType::UNKNOWN, \"UNKNOWN\"},"));
}

#[test]
fn test_array_field() {
    let code = generate_fan();
    assert!(code.header.contains("\t\t\tstd::vector<double> efficiency;"));
    assert!(code.header.contains("\t\t\tbool efficiency_is_set = false;"));

    let extractions: Vec<&str> = code
        .implementation
        .lines()
        .filter(|l| l.contains("json_get") && l.contains("efficiency"))
        .collect();
    assert_eq!(
        extractions,
        ["\t\t\tjson_get<std::vector<double>>(j, logger.get(), \"efficiency\", x.efficiency, x.efficiency_is_set, true);"]
    );
}

#[test]
fn test_polymorphic_field() {
    let code = generate_fan();
    assert!(code
        .header
        .contains("\t\t\tstd::unique_ptr<fan_ns::PerformanceMapTemplate> performance_map;"));
    assert_eq!(
        code.implementation
            .matches("if (x.operation_speed_control_type == fan_ns::SpeedControlType::")
            .count(),
        2
    );
    assert!(code.implementation.contains(
        "if (x.operation_speed_control_type == fan_ns::SpeedControlType::CONTINUOUS) {\n\t\t\t\tx.performance_map = std::make_unique<fan_ns::PerformanceMapContinuous>();"
    ));
    assert!(code.implementation.contains(
        "if (x.operation_speed_control_type == fan_ns::SpeedControlType::DISCRETE) {\n\t\t\t\tx.performance_map = std::make_unique<fan_ns::PerformanceMapDiscrete>();"
    ));
}

#[test]
fn test_declare_before_use() {
    let code = generate_fan();
    let header = &code.header;

    let grid = position(header, "struct GridVariablesContinuous :");
    let lookup = position(header, "struct LookupVariablesContinuous :");
    let lookup_struct = position(header, "struct LookupVariablesContinuousStruct {");
    let map = position(header, "struct PerformanceMapContinuous :");
    let template = position(header, "struct PerformanceMapTemplate {");
    let performance = position(header, "struct Performance {");

    assert!(grid < map);
    assert!(lookup < map);
    assert!(lookup_struct < map);
    assert!(template < performance);
    assert!(position(header, "enum class SpeedControlType") < performance);
}

#[test]
fn test_stock_extensions() {
    let code = generate_fan();
    let header = &code.header;

    assert!(header.contains(
        "\t\tstruct LookupVariablesContinuousStruct {\n\t\t\tdouble shaft_power;\n\t\t\tdouble impeller_rotational_speed;\n\t\t};"
    ));
    assert!(header.contains(
        "\t\t\tenum {\n\t\t\t\tstandard_air_volumetric_flow_rate_index,\n\t\t\t\tstatic_pressure_difference_index,\n\t\t\t\tindex_count\n\t\t\t};"
    ));
    assert!(header.contains("\t\t\tusing PerformanceMapTemplate::calculate_performance;"));
    assert!(header.contains(
        "\t\t\tLookupVariablesContinuousStruct calculate_performance(double standard_air_volumetric_flow_rate, double static_pressure_difference, Btwxt::Method performance_interpolation_method = Btwxt::Method::LINEAR);"
    ));
    assert_eq!(header.matches("calculate_performance(").count(), 1);
}

#[test]
fn test_without_extensions() {
    init_tracing();
    let code = generate_from_yaml(FAN_SCHEMA, "fan", &[], &CompilationSession::default())
        .expect("Failed to generate");
    assert!(!code.header.contains("LookupVariablesContinuousStruct"));
    assert!(!code.header.contains("index_count"));
    assert!(code.is_clean());
}

#[test]
fn test_metadata_and_serialization_trailer() {
    let code = generate_fan();

    assert!(code.header.starts_with("#ifndef FAN_H_\n#define FAN_H_\n#include <string>\n"));
    assert!(code.header.contains("\t\t\tconst static std::string_view schema_title;"));
    assert!(code.implementation.contains("const std::string_view Schema::schema_title = \"Fan Assembly\";"));
    assert!(code.implementation.contains("const std::string_view Performance::efficiency_units = \"-\";"));

    let trailer = position(&code.header, "NLOHMANN_JSON_SERIALIZE_ENUM (SpeedControlType, {");
    assert!(trailer > position(&code.header, "struct Performance {"));
    assert_eq!(code.header.matches("void from_json(const nlohmann::json& j, ").count(), 5);
}

#[test]
fn test_cyclic_groups_fail() {
    init_tracing();
    let yaml = r#"
A:
  Object Type: "Data Group"
  Data Elements:
    b:
      Data Type: "{B}"
B:
  Object Type: "Data Group"
  Data Elements:
    a:
      Data Type: "{A}"
"#;
    match generate_from_yaml(yaml, "loop", &[], &CompilationSession::default()) {
        Err(CodegenError::CyclicDeclarations { namespace, names }) => {
            assert_eq!(namespace, "loop_ns");
            assert_eq!(names, ["A", "B"]);
        }
        other => panic!("expected cycle error, got {other:?}"),
    }
}

#[test]
fn test_unresolved_type_fails() {
    let yaml = r#"
Fan:
  Object Type: "Data Group"
  Data Elements:
    motor:
      Data Type: "{Motor}"
"#;
    let result = generate_from_yaml(yaml, "fan", &[], &CompilationSession::default());
    assert!(matches!(
        result,
        Err(CodegenError::Schema(SchemaError::UnresolvedType { .. }))
    ));
}

#[test]
fn test_external_template_without_interface() {
    init_tracing();
    let rating = parse_schema(
        r#"
RatingTemplate:
  Object Type: "Data Group Template"
"#,
        "rating",
    )
    .expect("Failed to parse");
    let yaml = r#"
Schema:
  Object Type: "Meta"
  References:
    - rating
Rating:
  Object Type: "Data Group"
  Data Group Template: "RatingTemplate"
  Data Elements:
    value:
      Data Type: "Numeric"
"#;

    let code = generate_from_yaml(yaml, "fan_rating", &[rating.clone()], &CompilationSession::default())
        .expect("Failed to generate");
    assert_eq!(code.diagnostics.len(), 1);
    assert!(code.diagnostics[0].to_string().contains("'RatingTemplate'"));
    assert!(code.header.contains("#include <rating-template.h>"));

    let session = CompilationSession::default().with_interfaces(BaseInterfaces::new().with(
        "RatingTemplate",
        vec![MethodSignature::new("void", "initialize", ["const nlohmann::json& j"])],
    ));
    let code = generate_from_yaml(yaml, "fan_rating", &[rating], &session).expect("Failed to generate");
    assert!(code.is_clean());
    assert!(code.implementation.contains(
        "void Rating::initialize(const nlohmann::json& j) {\n\t\t\tjson_get<double>(j, logger.get(), \"value\", value, value_is_set, false);\n\t\t}"
    ));
}
