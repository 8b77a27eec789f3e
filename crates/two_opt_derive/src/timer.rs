use proc_macro::TokenStream;
use quote::quote;
use syn::{ItemFn, LitStr, parse_macro_input};

/// Wraps a function body and logs its wall-clock time at `info` level when it
/// returns. The optional string argument overrides the logged label, which
/// defaults to the function name. Requires an initialized logger to produce
/// output.
pub fn timer_inner(attr: TokenStream, item: TokenStream) -> TokenStream {
    let label = if attr.is_empty() {
        None
    } else {
        Some(parse_macro_input!(attr as LitStr).value())
    };

    let mut func = parse_macro_input!(item as ItemFn);
    let label = label.unwrap_or_else(|| func.sig.ident.to_string());
    let label_lit = LitStr::new(&label, proc_macro2::Span::call_site());
    let block = func.block;

    let wrapped: syn::Block = syn::parse_quote!({
        let __timer_started = std::time::Instant::now();
        let __timer_result = (move || #block)();
        log::info!(
            "{}: elapsed_s={:.3}",
            #label_lit,
            __timer_started.elapsed().as_secs_f64()
        );
        __timer_result
    });
    func.block = Box::new(wrapped);

    TokenStream::from(quote! { #func })
}
