use quote::quote;
use syn::{parse_quote, Expr, Lit, LitStr, Meta, MetaNameValue};
use synstructure::decl_derive;

/// Derives `Default` and a `help` text from the documentation of each field.
///
/// A field documented with `(Default: <expr>)` is initialized with `<expr>`, all other fields use
/// their own `Default`. The generated `help()` lists each field name followed by its
/// documentation.
fn derive_doc_default(s: synstructure::Structure) -> proc_macro2::TokenStream {
    let variant = match s.variants() {
        [variant] => variant,
        _ => panic!("DocDefault requires a struct"),
    };

    let default_re = regex::Regex::new(r"\(Default: (.*)\)").unwrap();

    let mut help = String::new();

    for binding in variant.bindings() {
        let field = binding.ast();
        let name = match &field.ident {
            Some(ident) => ident.to_string(),
            None => panic!("DocDefault requires named fields"),
        };
        let doc = doc_lines(&field.attrs).join(" ");
        help.push_str(&format!("{}:\n    {}\n", name, doc.trim()));
    }

    let body = variant.construct(|field, _| {
        let mut default_value: Expr = parse_quote!(Default::default());
        for attr in field.attrs.iter() {
            if let Some(doc_str) = doc_str(attr) {
                if let Some(default_str) = default_re.captures(&doc_str.value()) {
                    let default_str = default_str.get(1).unwrap().as_str();
                    let default_str = LitStr::new(default_str, doc_str.span());
                    default_value = default_str
                        .parse()
                        .expect("error parsing default expression");
                }
            }
        }
        default_value
    });

    let name = &s.ast().ident;
    let (impl_generics, ty_generics, where_clause) = s.ast().generics.split_for_impl();

    let default_impl = s.gen_impl(quote! {
        gen impl Default for @Self {
            fn default() -> Self {
                #body
            }
        }
    });

    quote! {
        #default_impl

        impl #impl_generics #name #ty_generics #where_clause {
            /// Names and documentation of all options.
            pub fn help() -> &'static str {
                #help
            }
        }
    }
}

fn doc_str(attr: &syn::Attribute) -> Option<LitStr> {
    match attr.parse_meta() {
        Ok(Meta::NameValue(MetaNameValue {
            ident,
            lit: Lit::Str(doc_str),
            ..
        })) => {
            if ident == "doc" {
                Some(doc_str)
            } else {
                None
            }
        }
        _ => None,
    }
}

fn doc_lines(attrs: &[syn::Attribute]) -> Vec<String> {
    attrs
        .iter()
        .filter_map(doc_str)
        .map(|doc_str| doc_str.value().trim().to_owned())
        .collect()
}

decl_derive!([DocDefault] => derive_doc_default);
