use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::{format_ident, quote};
use syn::punctuated::Punctuated;
use syn::spanned::Spanned;
use syn::{
    Expr, FnArg, Ident, ImplItem, ImplItemFn, ItemImpl, LitStr, Result, Token, Type,
    parse::Parse, parse::ParseStream,
};

/// #[notification_handlers] 宏实现
/// - 仅用于 `impl` 块；收集带 `#[notification(...)]` 标记的方法
/// - 校验处理方法签名：`&self` + 恰好一个 `EventRecord` / `&EventRecord` 参数
/// - 生成 `::bucket_notify::notification::NotificationComponent` 实现
/// - 支持：`#[notification_handlers(name = "...")]` 覆写组件名称
pub(crate) fn expand(attr: TokenStream, item: TokenStream) -> TokenStream {
    let cfg = match syn::parse::<ComponentAttrConfig>(attr) {
        Ok(cfg) => cfg,
        Err(err) => return err.to_compile_error().into(),
    };
    let item = match syn::parse::<ItemImpl>(item) {
        Ok(item) => item,
        Err(err) => {
            return syn::Error::new(
                err.span(),
                "#[notification_handlers] can only be used on impl blocks",
            )
            .to_compile_error()
            .into();
        }
    };

    match expand_impl(cfg, item) {
        Ok(out) => out.into(),
        Err(err) => err.to_compile_error().into(),
    }
}

pub(crate) fn expand_impl(cfg: ComponentAttrConfig, mut item: ItemImpl) -> Result<TokenStream2> {
    if let Some(trait_) = &item.trait_ {
        return Err(syn::Error::new(
            trait_.1.span(),
            "#[notification_handlers] must be placed on an inherent impl block",
        ));
    }

    let mut declarations = Vec::new();

    for impl_item in item.items.iter_mut() {
        let ImplItem::Fn(method) = impl_item else {
            continue;
        };

        let mut marker: Option<MarkerConfig> = None;
        let mut retained_attrs = Vec::new();
        for attr in method.attrs.iter() {
            if attr.path().is_ident("notification") {
                if marker.is_some() {
                    return Err(syn::Error::new(
                        attr.span(),
                        "duplicate #[notification] on the same method",
                    ));
                }
                marker = Some(parse_marker_attr(attr)?);
            } else {
                retained_attrs.push(attr.clone());
            }
        }

        let Some(marker) = marker else {
            continue;
        };
        method.attrs = retained_attrs;

        let arg = validate_signature(method)?;
        declarations.push(declaration_tokens(method, &marker, arg));
    }

    let component_name = match cfg.name {
        Some(lit) => lit,
        None => LitStr::new(&type_display_name(&item.self_ty), item.self_ty.span()),
    };

    let self_ty = &item.self_ty;
    let (impl_generics, _, where_clause) = item.generics.split_for_impl();

    Ok(quote! {
        #item

        impl #impl_generics ::bucket_notify::notification::NotificationComponent for #self_ty #where_clause {
            fn component_name(&self) -> &str {
                #component_name
            }

            fn notification_handlers(
                self: ::std::sync::Arc<Self>,
            ) -> ::std::vec::Vec<::bucket_notify::notification::HandlerDeclaration> {
                ::std::vec![ #( #declarations, )* ]
            }
        }
    })
}

/// 处理方法的参数传递方式
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum RecordArg {
    Owned,
    Borrowed,
}

// 校验：&self 接收者、无泛型、恰好一个 EventRecord 参数
pub(crate) fn validate_signature(method: &ImplItemFn) -> Result<RecordArg> {
    let sig = &method.sig;
    let name = &sig.ident;

    match sig.receiver() {
        Some(recv) if recv.reference.is_some() && recv.mutability.is_none() => {}
        Some(recv) => {
            return Err(syn::Error::new(
                recv.span(),
                format!("notification handler `{name}` must take `&self`"),
            ));
        }
        None => {
            return Err(syn::Error::new(
                sig.span(),
                format!("notification handler `{name}` must take `&self`"),
            ));
        }
    }

    if !sig.generics.params.is_empty() {
        return Err(syn::Error::new(
            sig.generics.span(),
            format!("notification handler `{name}` must not be generic"),
        ));
    }

    let params: Vec<&syn::PatType> = sig
        .inputs
        .iter()
        .filter_map(|arg| match arg {
            FnArg::Typed(pt) => Some(pt),
            FnArg::Receiver(_) => None,
        })
        .collect();

    if params.len() != 1 {
        return Err(syn::Error::new(
            sig.inputs.span(),
            format!(
                "notification handler `{name}` must take exactly one `EventRecord` parameter, found {}",
                params.len()
            ),
        ));
    }

    let ty = params[0].ty.as_ref();
    match ty {
        Type::Reference(r) if r.mutability.is_none() && is_event_record(&r.elem) => {
            Ok(RecordArg::Borrowed)
        }
        other if is_event_record(other) => Ok(RecordArg::Owned),
        other => Err(syn::Error::new(
            other.span(),
            format!("parameter of notification handler `{name}` must be `EventRecord` or `&EventRecord`"),
        )),
    }
}

fn is_event_record(ty: &Type) -> bool {
    match ty {
        Type::Path(tp) if tp.qself.is_none() => tp
            .path
            .segments
            .last()
            .map(|seg| seg.ident == "EventRecord" && seg.arguments.is_empty())
            .unwrap_or(false),
        Type::Paren(p) => is_event_record(&p.elem),
        Type::Group(g) => is_event_record(&g.elem),
        _ => false,
    }
}

fn declaration_tokens(method: &ImplItemFn, marker: &MarkerConfig, arg: RecordArg) -> TokenStream2 {
    let method_ident = &method.sig.ident;
    let name = LitStr::new(&method_ident.to_string(), method_ident.span());
    let record = format_ident!("record");

    let events = &marker.events;
    let prefix = marker.prefix.clone().unwrap_or_else(|| LitStr::new("", method_ident.span()));
    let suffix = marker.suffix.clone().unwrap_or_else(|| LitStr::new("", method_ident.span()));
    let bucket = marker.bucket.as_ref().map(|b| quote! { .bucket(#b) });

    let call_arg = match arg {
        RecordArg::Owned => quote! { #record },
        RecordArg::Borrowed => quote! { &#record },
    };
    let call = if method.sig.asyncness.is_some() {
        quote! { this.#method_ident(#call_arg).await }
    } else {
        quote! { this.#method_ident(#call_arg) }
    };

    quote! {
        {
            let this = ::std::sync::Arc::clone(&self);
            ::bucket_notify::notification::HandlerDeclaration::new(
                #name,
                ::bucket_notify::notification::NotificationMarker::builder()
                    .event_types(::std::vec![ #( ::std::string::String::from(#events) ),* ])
                    .prefix(#prefix)
                    .suffix(#suffix)
                    #bucket
                    .build(),
                ::bucket_notify::notification::handler_fn(
                    move |#record: ::bucket_notify::record::EventRecord| {
                        let this = ::std::sync::Arc::clone(&this);
                        async move {
                            ::bucket_notify::notification::HandlerOutcome::into_result(#call)
                        }
                    },
                ),
            )
        }
    }
}

// 组件名称默认取 impl 目标类型路径的最后一段
fn type_display_name(ty: &Type) -> String {
    match ty {
        Type::Path(tp) => tp
            .path
            .segments
            .last()
            .map(|seg| seg.ident.to_string())
            .unwrap_or_else(|| quote!(#ty).to_string()),
        other => quote!(#other).to_string(),
    }
}

// -------- parsing --------

pub(crate) struct ComponentAttrConfig {
    name: Option<LitStr>,
}

impl Parse for ComponentAttrConfig {
    fn parse(input: ParseStream) -> Result<Self> {
        let mut name: Option<LitStr> = None;

        if input.is_empty() {
            return Ok(Self { name });
        }

        let pairs: Punctuated<MarkerKv, Token![,]> = Punctuated::parse_terminated(input)?;
        for kv in pairs {
            match kv.key.to_string().as_str() {
                "name" => {
                    if name.is_some() {
                        return Err(syn::Error::new(
                            kv.key.span(),
                            "duplicate key 'name' in attribute",
                        ));
                    }
                    name = Some(expect_str(kv.value, "name")?);
                }
                _ => {
                    return Err(syn::Error::new(
                        kv.key.span(),
                        "unknown key in attribute; expected 'name'",
                    ));
                }
            }
        }

        Ok(Self { name })
    }
}

pub(crate) struct MarkerConfig {
    events: Vec<LitStr>,
    prefix: Option<LitStr>,
    suffix: Option<LitStr>,
    bucket: Option<LitStr>,
}

pub(crate) fn parse_marker_attr(attr: &syn::Attribute) -> Result<MarkerConfig> {
    let syn::Meta::List(_) = &attr.meta else {
        return Err(syn::Error::new(
            attr.span(),
            "expected #[notification(events = [...], prefix = \"...\", suffix = \"...\")]",
        ));
    };

    let mut events: Option<Vec<LitStr>> = None;
    let mut prefix: Option<LitStr> = None;
    let mut suffix: Option<LitStr> = None;
    let mut bucket: Option<LitStr> = None;

    let pairs: Punctuated<MarkerKv, Token![,]> =
        attr.parse_args_with(Punctuated::<MarkerKv, Token![,]>::parse_terminated)?;

    for kv in pairs {
        let key = kv.key.to_string();
        let slot_taken = match key.as_str() {
            "events" => events.is_some(),
            "prefix" => prefix.is_some(),
            "suffix" => suffix.is_some(),
            "bucket" => bucket.is_some(),
            _ => {
                return Err(syn::Error::new(
                    kv.key.span(),
                    "unknown key; expected 'events' | 'prefix' | 'suffix' | 'bucket'",
                ));
            }
        };
        if slot_taken {
            return Err(syn::Error::new(
                kv.key.span(),
                format!("duplicate key '{key}' in attribute"),
            ));
        }

        match key.as_str() {
            "events" => events = Some(expect_str_array(kv.value)?),
            "prefix" => prefix = Some(expect_str(kv.value, "prefix")?),
            "suffix" => suffix = Some(expect_str(kv.value, "suffix")?),
            _ => bucket = Some(expect_str(kv.value, "bucket")?),
        }
    }

    let events = events.ok_or_else(|| {
        syn::Error::new(attr.span(), "missing key 'events' in #[notification(...)]")
    })?;
    if events.is_empty() {
        return Err(syn::Error::new(attr.span(), "'events' must not be empty"));
    }

    Ok(MarkerConfig {
        events,
        prefix,
        suffix,
        bucket,
    })
}

fn expect_str(value: Expr, key: &str) -> Result<LitStr> {
    match value {
        Expr::Lit(syn::ExprLit {
            lit: syn::Lit::Str(lit),
            ..
        }) => Ok(lit),
        other => Err(syn::Error::new(
            other.span(),
            format!("expected string literal for '{key}'"),
        )),
    }
}

fn expect_str_array(value: Expr) -> Result<Vec<LitStr>> {
    match value {
        Expr::Array(arr) => arr
            .elems
            .into_iter()
            .map(|e| expect_str(e, "events"))
            .collect(),
        // 单个事件类型可省略方括号
        lit @ Expr::Lit(_) => Ok(vec![expect_str(lit, "events")?]),
        other => Err(syn::Error::new(
            other.span(),
            "expected array of string literals for 'events'",
        )),
    }
}

struct MarkerKv {
    key: Ident,
    #[allow(dead_code)]
    eq: Token![=],
    value: Expr,
}

impl Parse for MarkerKv {
    fn parse(input: ParseStream) -> Result<Self> {
        Ok(Self {
            key: input.parse()?,
            eq: input.parse()?,
            value: input.parse()?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn expand_str(item: ItemImpl) -> Result<String> {
        expand_impl(ComponentAttrConfig { name: None }, item).map(|ts| ts.to_string())
    }

    fn error_of(item: ItemImpl) -> String {
        match expand_impl(ComponentAttrConfig { name: None }, item) {
            Ok(_) => panic!("expected expansion to fail"),
            Err(err) => err.to_string(),
        }
    }

    #[test]
    fn generates_component_impl_for_tagged_methods() {
        let item: ItemImpl = syn::parse_quote! {
            impl Thumbnails {
                #[notification(events = ["s3:ObjectCreated:*"], prefix = "img/", suffix = ".jpg")]
                async fn on_image(&self, record: EventRecord) -> anyhow::Result<()> {
                    Ok(())
                }

                #[notification(events = "s3:ObjectRemoved:*", bucket = "archive")]
                fn on_removed(&self, record: &EventRecord) {}

                fn helper(&self) {}
            }
        };

        let out = expand_str(item).expect("expansion succeeds");
        assert!(out.contains("NotificationComponent for Thumbnails"));
        assert!(out.contains("\"Thumbnails\""));
        assert!(out.contains("\"on_image\""));
        assert!(out.contains("\"on_removed\""));
        assert!(out.contains("\"archive\""));
        assert!(!out.contains("\"helper\""));
        // 标记属性被移除
        assert!(!out.contains("# [notification"));
    }

    #[test]
    fn component_without_tagged_methods_registers_nothing() {
        let item: ItemImpl = syn::parse_quote! {
            impl Plain {
                fn helper(&self) {}
            }
        };

        let out = expand_str(item).expect("expansion succeeds");
        assert!(out.contains("NotificationComponent for Plain"));
        assert!(!out.contains("HandlerDeclaration :: new"));
    }

    #[test]
    fn name_override_is_used() {
        let item: ItemImpl = syn::parse_quote! {
            impl Plain {}
        };
        let cfg: ComponentAttrConfig = syn::parse_quote!(name = "media-indexer");

        let out = expand_impl(cfg, item).expect("expansion succeeds").to_string();
        assert!(out.contains("\"media-indexer\""));
    }

    #[test]
    fn rejects_handler_without_parameter() {
        let err = error_of(syn::parse_quote! {
            impl Thumbnails {
                #[notification(events = ["created"])]
                async fn on_image(&self) {}
            }
        });
        assert!(err.contains("exactly one `EventRecord` parameter, found 0"), "{err}");
    }

    #[test]
    fn rejects_handler_with_two_parameters() {
        let err = error_of(syn::parse_quote! {
            impl Thumbnails {
                #[notification(events = ["created"])]
                async fn on_image(&self, record: EventRecord, retries: u32) {}
            }
        });
        assert!(err.contains("found 2"), "{err}");
    }

    #[test]
    fn rejects_wrong_parameter_type() {
        let err = error_of(syn::parse_quote! {
            impl Thumbnails {
                #[notification(events = ["created"])]
                async fn on_image(&self, record: String) {}
            }
        });
        assert!(err.contains("must be `EventRecord` or `&EventRecord`"), "{err}");

        let err = error_of(syn::parse_quote! {
            impl Thumbnails {
                #[notification(events = ["created"])]
                async fn on_image(&self, record: &mut EventRecord) {}
            }
        });
        assert!(err.contains("must be `EventRecord` or `&EventRecord`"), "{err}");
    }

    #[test]
    fn rejects_non_ref_receivers() {
        let err = error_of(syn::parse_quote! {
            impl Thumbnails {
                #[notification(events = ["created"])]
                fn on_image(record: EventRecord) {}
            }
        });
        assert!(err.contains("must take `&self`"), "{err}");

        let err = error_of(syn::parse_quote! {
            impl Thumbnails {
                #[notification(events = ["created"])]
                fn on_image(&mut self, record: EventRecord) {}
            }
        });
        assert!(err.contains("must take `&self`"), "{err}");
    }

    #[test]
    fn rejects_bad_marker_contents() {
        let err = error_of(syn::parse_quote! {
            impl Thumbnails {
                #[notification(events = [])]
                fn on_image(&self, record: EventRecord) {}
            }
        });
        assert!(err.contains("'events' must not be empty"), "{err}");

        let err = error_of(syn::parse_quote! {
            impl Thumbnails {
                #[notification(prefix = "img/")]
                fn on_image(&self, record: EventRecord) {}
            }
        });
        assert!(err.contains("missing key 'events'"), "{err}");

        let err = error_of(syn::parse_quote! {
            impl Thumbnails {
                #[notification(events = ["created"], topic = "x")]
                fn on_image(&self, record: EventRecord) {}
            }
        });
        assert!(err.contains("unknown key"), "{err}");
    }

    #[test]
    fn accepts_qualified_record_path() {
        let method: ImplItemFn = syn::parse_quote! {
            async fn on_image(&self, record: &bucket_notify::record::EventRecord) {}
        };
        assert_eq!(
            validate_signature(&method).expect("valid signature"),
            RecordArg::Borrowed
        );
    }
}
