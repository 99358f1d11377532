use proc_macro::TokenStream;
use quote::quote;
use syn::{parse_macro_input, Attribute, Data, DeriveInput, Fields, Lit, LitStr, Meta, Type};

/// Derive macro that generates field accessor metadata for a configuration record.
///
/// For each named field, extracts:
/// - Field name (respects #[serde(rename = "...")])
/// - Label (from #[field(label = "...")], defaults to the field name)
/// - Required (false for Option<T> and for fields carrying #[serde(default)])
/// - Read-only (from #[field(readonly)])
/// - Description (from doc comments)
///
/// Generates a `field_schema() -> &'static [FieldInfo]` method. `FieldInfo` must be
/// in scope where the derive is used.
#[proc_macro_derive(FieldSchema, attributes(serde, field))]
pub fn derive_field_schema(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    let name = &input.ident;

    let fields = match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(fields) => &fields.named,
            _ => {
                return syn::Error::new_spanned(name, "FieldSchema requires named fields")
                    .to_compile_error()
                    .into()
            }
        },
        _ => {
            return syn::Error::new_spanned(name, "FieldSchema only supports structs")
                .to_compile_error()
                .into()
        }
    };

    let mut entries = Vec::new();
    for field in fields {
        let Some(ident) = field.ident.as_ref() else {
            continue;
        };
        let field_name = get_serde_rename(&field.attrs).unwrap_or_else(|| ident.to_string());
        let options = match FieldOptions::parse(&field.attrs) {
            Ok(options) => options,
            Err(err) => return err.to_compile_error().into(),
        };
        let label = options.label.unwrap_or_else(|| field_name.clone());
        let readonly = options.readonly;
        let required = !is_option_type(&field.ty) && !has_serde_default(&field.attrs);
        let description = get_doc_comment(&field.attrs);

        entries.push(quote! {
            FieldInfo {
                name: #field_name,
                label: #label,
                required: #required,
                readonly: #readonly,
                description: #description,
            }
        });
    }

    let expanded = quote! {
        impl #name {
            pub fn field_schema() -> &'static [FieldInfo] {
                static SCHEMA: &[FieldInfo] = &[
                    #(#entries),*
                ];
                SCHEMA
            }
        }
    };

    TokenStream::from(expanded)
}

#[derive(Default)]
struct FieldOptions {
    label: Option<String>,
    readonly: bool,
}

impl FieldOptions {
    fn parse(attrs: &[Attribute]) -> syn::Result<Self> {
        let mut options = FieldOptions::default();
        for attr in attrs.iter().filter(|a| a.path().is_ident("field")) {
            attr.parse_nested_meta(|meta| {
                if meta.path.is_ident("label") {
                    let value: LitStr = meta.value()?.parse()?;
                    options.label = Some(value.value());
                    Ok(())
                } else if meta.path.is_ident("readonly") {
                    options.readonly = true;
                    Ok(())
                } else {
                    Err(meta.error("expected `label = \"...\"` or `readonly`"))
                }
            })?;
        }
        Ok(options)
    }
}

fn serde_tokens(attrs: &[Attribute]) -> impl Iterator<Item = String> + '_ {
    attrs
        .iter()
        .filter(|attr| attr.path().is_ident("serde"))
        .filter_map(|attr| match &attr.meta {
            Meta::List(meta_list) => Some(meta_list.tokens.to_string()),
            _ => None,
        })
}

fn get_serde_rename(attrs: &[Attribute]) -> Option<String> {
    for tokens in serde_tokens(attrs) {
        // Simple parsing: look for rename = "..."
        let Some(start) = tokens.find("rename") else {
            continue;
        };
        let rest = &tokens[start..];
        if let Some(eq_pos) = rest.find('=') {
            let after_eq = rest[eq_pos + 1..].trim();
            if let Some(stripped) = after_eq.strip_prefix('"') {
                if let Some(end_quote) = stripped.find('"') {
                    return Some(stripped[..end_quote].to_string());
                }
            }
        }
    }
    None
}

fn has_serde_default(attrs: &[Attribute]) -> bool {
    serde_tokens(attrs).any(|tokens| tokens.contains("default"))
}

fn get_doc_comment(attrs: &[Attribute]) -> String {
    attrs
        .iter()
        .filter_map(|attr| {
            if !attr.path().is_ident("doc") {
                return None;
            }
            if let Meta::NameValue(meta) = &attr.meta {
                if let syn::Expr::Lit(expr_lit) = &meta.value {
                    if let Lit::Str(lit_str) = &expr_lit.lit {
                        return Some(lit_str.value().trim().to_string());
                    }
                }
            }
            None
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn is_option_type(ty: &Type) -> bool {
    if let Type::Path(type_path) = ty {
        if let Some(segment) = type_path.path.segments.last() {
            return segment.ident == "Option";
        }
    }
    false
}
