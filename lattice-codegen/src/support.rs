//! Standalone superclass headers.
//!
//! A Data Group Template declared in another schema is consumed through its
//! own header, `<kebab(template)>.h`, declaring the abstract base struct.

use crate::interfaces::MethodSignature;
use crate::session::GeneratorOptions;
use lattice_schema::kebab_style;

/// Returns the header file name of a template (`RatingTemplate` -> `rating-template.h`).
#[must_use]
pub fn superclass_header_name(template: &str) -> String {
    format!("{}.h", kebab_style(template))
}

/// Renders the header declaring an abstract base struct.
#[must_use]
pub fn superclass_header(template: &str, methods: &[MethodSignature], options: &GeneratorOptions) -> String {
    let guard = format!("{}_H_", template.to_uppercase());
    let mut output = format!(
        "#ifndef {guard}\n#define {guard}\n#include <nlohmann/json.hpp>\n\n{}\n\n",
        options.generated_note
    );
    output.push_str(&format!("struct {template} {{\n\tvirtual ~{template}() = default;\n"));
    for method in methods {
        output.push_str(&format!(
            "\tvirtual {} {}({}) = 0;\n",
            method.return_type,
            method.name,
            method.arguments.join(", ")
        ));
    }
    output.push_str("};\n\n#endif\n");
    output
}
