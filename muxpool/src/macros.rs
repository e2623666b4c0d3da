//! Macro generating transparent service proxies.
//!
//! [`remote_service!`] is the compile-time counterpart of runtime proxy
//! synthesis: from one interface block it emits the interface trait, a
//! descriptor, and a proxy type whose every method forwards through a
//! dispatcher and blocks until the reply resolves.
//!
//! [`remote_service!`]: crate::remote_service

/// Define a remote service interface and its transparent proxy.
///
/// Generates, from one declaration:
/// - the interface trait, with each method returning
///   `Result<Ret, DispatchError>`
/// - the proxy type, implementing the trait by forwarding every method
///   through a [`MethodDispatcher`](crate::MethodDispatcher)
/// - a [`RemoteInterface`](crate::RemoteInterface) impl carrying the
///   service name and method-name descriptor
///
/// The proxy is a drop-in stand-in wherever the trait is expected. Only the
/// declared interface methods are routed through the dispatcher; anything
/// else a caller defines on their own types keeps its original behavior.
///
/// # Example
///
/// ```rust
/// use std::sync::Arc;
/// use muxpool::{remote_service, CallReply, MethodCall, MethodDispatcher};
///
/// remote_service! {
///     /// Echo service.
///     pub Echo("Echo") as EchoProxy {
///         /// Round-trip a message.
///         fn echo(&self, message: String) -> String;
///     }
/// }
///
/// struct ImmediateDispatcher;
///
/// impl MethodDispatcher for ImmediateDispatcher {
///     fn dispatch_method_call(&self, call: MethodCall) -> CallReply<Vec<u8>> {
///         // A real dispatcher routes through the sink chain; this one
///         // echoes the encoded argument tuple's first element back.
///         let (message,): (String,) = serde_json::from_slice(&call.args).unwrap();
///         CallReply::resolved(serde_json::to_vec(&message).unwrap())
///     }
/// }
///
/// let proxy = EchoProxy::new(Arc::new(ImmediateDispatcher)).unwrap();
/// assert_eq!(proxy.echo("hello".to_string()).unwrap(), "hello");
/// ```
#[macro_export]
macro_rules! remote_service {
    (
        $(#[$iface_meta:meta])*
        $vis:vis $iface:ident ($service:literal) as $proxy:ident {
            $(
                $(#[$method_meta:meta])*
                fn $method:ident(&self $(, $arg:ident : $arg_ty:ty)* $(,)?) -> $ret:ty;
            )*
        }
    ) => {
        $(#[$iface_meta])*
        $vis trait $iface {
            $(
                $(#[$method_meta])*
                fn $method(&self $(, $arg: $arg_ty)*)
                    -> ::std::result::Result<$ret, $crate::DispatchError>;
            )*
        }

        #[doc = ::std::concat!(
            "Transparent proxy for the [`", ::std::stringify!($iface),
            "`] remote interface.\n\nForwards every interface method through ",
            "its dispatcher and blocks until the reply resolves."
        )]
        $vis struct $proxy<D, C = $crate::JsonCallCodec> {
            core: $crate::ProxyCore<D, C>,
        }

        impl<D, C> $crate::RemoteInterface for $proxy<D, C> {
            const SERVICE: &'static str = $service;

            fn method_names() -> &'static [&'static str] {
                &[$(::std::stringify!($method)),*]
            }
        }

        impl<D: $crate::MethodDispatcher> $proxy<D, $crate::JsonCallCodec> {
            /// Bind the interface to a dispatcher using the default codec.
            ///
            /// # Errors
            ///
            /// Returns a configuration error when the interface declares no
            /// remote methods.
            $vis fn new(
                dispatcher: ::std::sync::Arc<D>,
            ) -> ::std::result::Result<Self, $crate::ConfigurationError> {
                Self::with_codec(dispatcher, $crate::JsonCallCodec)
            }
        }

        impl<D: $crate::MethodDispatcher, C: $crate::CallCodec> $proxy<D, C> {
            /// Bind the interface to a dispatcher with an explicit codec.
            ///
            /// # Errors
            ///
            /// Returns a configuration error when the interface declares no
            /// remote methods.
            $vis fn with_codec(
                dispatcher: ::std::sync::Arc<D>,
                codec: C,
            ) -> ::std::result::Result<Self, $crate::ConfigurationError> {
                ::std::result::Result::Ok(Self {
                    core: $crate::ProxyCore::new(
                        dispatcher,
                        codec,
                        <Self as $crate::RemoteInterface>::SERVICE,
                        <Self as $crate::RemoteInterface>::method_names(),
                    )?,
                })
            }
        }

        impl<D: $crate::MethodDispatcher, C: $crate::CallCodec> $iface for $proxy<D, C> {
            $(
                fn $method(&self $(, $arg: $arg_ty)*)
                    -> ::std::result::Result<$ret, $crate::DispatchError>
                {
                    self.core.call(::std::stringify!($method), &($($arg,)*))
                }
            )*
        }

        impl<D, C: ::std::clone::Clone> ::std::clone::Clone for $proxy<D, C> {
            fn clone(&self) -> Self {
                Self {
                    core: self.core.clone(),
                }
            }
        }

        impl<D, C> ::std::fmt::Debug for $proxy<D, C> {
            fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                f.debug_struct(::std::stringify!($proxy))
                    .field("core", &self.core)
                    .finish()
            }
        }
    };
}
