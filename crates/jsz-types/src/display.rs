//! Type stringification.
//!
//! Union members print in a stable lexical order of their rendered forms, so
//! two equal unions always display identically regardless of construction
//! order. Cyclic object graphs terminate through the display recursion guard
//! and render the cycle point as `...`.

use crate::recursion::{RecursionGuard, RecursionProfile, RecursionResult};
use crate::registry::TypeRegistry;
use crate::types::{FunctionKind, TypeData, TypeId, ValueKind};

/// Render a type for diagnostics and debugging.
pub fn display(registry: &TypeRegistry, ty: TypeId) -> String {
    let mut formatter = TypeFormatter::new(registry);
    formatter.format(ty)
}

pub struct TypeFormatter<'a> {
    registry: &'a TypeRegistry,
    guard: RecursionGuard<TypeId>,
}

impl<'a> TypeFormatter<'a> {
    pub fn new(registry: &'a TypeRegistry) -> Self {
        Self {
            registry,
            guard: RecursionGuard::with_profile(RecursionProfile::Display),
        }
    }

    pub fn format(&mut self, ty: TypeId) -> String {
        match self.guard.enter(ty) {
            RecursionResult::CycleDetected | RecursionResult::DepthExceeded => "...".to_string(),
            RecursionResult::Entered => {
                let rendered = self.format_inner(ty);
                self.guard.leave(ty);
                rendered
            }
        }
    }

    fn format_inner(&mut self, ty: TypeId) -> String {
        match self.registry.lookup(ty) {
            TypeData::Unknown => "?".to_string(),
            TypeData::CheckedUnknown => "??".to_string(),
            TypeData::All => "*".to_string(),
            TypeData::NoType => "None".to_string(),
            TypeData::NoObject => "NoObject".to_string(),
            TypeData::NoResolved => "NoResolvedType".to_string(),
            TypeData::Value(kind) => match kind {
                ValueKind::Number => "number".to_string(),
                ValueKind::String => "string".to_string(),
                ValueKind::Boolean => "boolean".to_string(),
                ValueKind::Null => "null".to_string(),
                ValueKind::Void => "undefined".to_string(),
            },
            TypeData::ValueObject(kind) => match kind {
                ValueKind::Number => "Number".to_string(),
                ValueKind::String => "String".to_string(),
                ValueKind::Boolean => "Boolean".to_string(),
                ValueKind::Null | ValueKind::Void => "?".to_string(),
            },
            TypeData::Object(id) => {
                let Some(data) = self.registry.object_data(id) else {
                    return "?".to_string();
                };
                match data.name {
                    Some(name) => self.registry.strings().resolve(name).to_string(),
                    None => {
                        let mut names = data.own_property_names();
                        names.sort_unstable_by_key(|&n| self.registry.strings().resolve(n));
                        let fields: Vec<String> = names
                            .iter()
                            .filter_map(|&n| {
                                data.own_property(n).map(|prop| {
                                    format!(
                                        "{}: {}",
                                        self.registry.strings().resolve(n),
                                        self.format(prop.ty)
                                    )
                                })
                            })
                            .collect();
                        format!("{{{}}}", fields.join(", "))
                    }
                }
            }
            TypeData::Function(id) => {
                let shape = self.registry.function_shape(id);
                let params: Vec<String> = shape
                    .params
                    .iter()
                    .map(|p| {
                        let rendered = self.format(p.ty);
                        if p.variadic {
                            format!("...{rendered}")
                        } else if p.optional {
                            format!("{rendered}=")
                        } else {
                            rendered
                        }
                    })
                    .collect();
                match (shape.kind, shape.instance) {
                    (FunctionKind::Constructor, Some(instance)) => format!(
                        "function(new:{}, {}): {}",
                        self.format(instance),
                        params.join(", "),
                        self.format(shape.ret)
                    ),
                    _ => format!("function({}): {}", params.join(", "), self.format(shape.ret)),
                }
            }
            TypeData::Union(list) => {
                let alts = self.registry.type_list(list);
                let mut rendered: Vec<String> = alts.iter().map(|&alt| self.format(alt)).collect();
                rendered.sort_unstable();
                format!("({})", rendered.join("|"))
            }
            TypeData::Enum(id) => match self.registry.enum_data(id) {
                Some(data) => format!(
                    "enum{{{}}}",
                    self.registry.strings().resolve(data.name)
                ),
                None => "?".to_string(),
            },
            TypeData::EnumElement(id) => match self.registry.enum_data(id) {
                Some(data) => self.registry.strings().resolve(data.name).to_string(),
                None => "?".to_string(),
            },
            TypeData::Record(id) => {
                let fields = self.registry.record_shape(id);
                let mut rendered: Vec<String> = fields
                    .iter()
                    .map(|&(name, field_ty)| {
                        format!(
                            "{}: {}",
                            self.registry.strings().resolve(name),
                            self.format(field_ty)
                        )
                    })
                    .collect();
                rendered.sort_unstable();
                format!("{{{}}}", rendered.join(", "))
            }
            TypeData::TemplateParam(p) => self.registry.strings().resolve(p.name).to_string(),
            TypeData::NamedRef(id) => {
                let unwrapped = self.registry.unwrap_proxy(ty);
                if unwrapped != ty {
                    self.format(unwrapped)
                } else {
                    match self.registry.named_type_name(id) {
                        Some(name) => self.registry.strings().resolve(name).to_string(),
                        None => "NoResolvedType".to_string(),
                    }
                }
            }
        }
    }
}

#[cfg(test)]
#[path = "../tests/display_tests.rs"]
mod tests;
