use quote::{format_ident, quote};
use syn::{parse_macro_input, LitStr};

/// Expands to one `#[test]` per `.lox` fixture below the given directory (relative to the
/// `bin` crate), each calling `lox_expect` with the fixture's contents.
#[proc_macro]
pub fn generate_tests(input: proc_macro::TokenStream) -> proc_macro::TokenStream {
    let fixture_dir = parse_macro_input!(input as LitStr).value();
    let root_dir = format!("{}/../../{}", env!("CARGO_MANIFEST_DIR"), fixture_dir);

    let mut fixtures: Vec<_> = walkdir::WalkDir::new(&root_dir)
        .into_iter()
        .flatten()
        .filter(|entry| entry.path().extension() == Some("lox".as_ref()))
        .map(|entry| entry.into_path())
        .collect();
    fixtures.sort();

    let tests = fixtures.iter().map(|path| {
        let test_file_path = path.to_string_lossy();
        let relative_test_path = path.strip_prefix(&root_dir).unwrap().to_string_lossy();
        let test_ident = format_ident!(
            "test_{}",
            relative_test_path.replace(['/', '-'], "_").trim_end_matches(".lox")
        );
        quote! {
            #[test]
            fn #test_ident() {
                lox_expect(std::fs::read_to_string(#test_file_path).unwrap().as_str());
            }
        }
    });

    quote! {
        #[ctor::ctor]
        fn init() {
            let _ = env_logger::builder().is_test(true).try_init();
        }

        #(#tests)*
    }
    .into()
}
