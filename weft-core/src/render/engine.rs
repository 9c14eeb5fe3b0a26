//! The render engine.

use std::collections::HashMap;
use std::sync::Arc;

use minijinja::value::{Object, ObjectRepr};
use minijinja::{AutoEscape, Environment, ErrorKind, Value};
use parking_lot::Mutex;

use super::context::RenderScope;
use super::markers::{self, Marker};
use crate::component::{ChildValue, Component, ComponentRef, Live, Snapshot};
use crate::error::RenderError;
use crate::registry::{ComponentId, Registry};

/// Attribute carrying a component's identifier on its container element.
pub const ID_ATTRIBUTE: &str = "data-weft-id";

/// Attribute marking a two-way bound input, used to restore focus and caret.
pub const BIND_ATTRIBUTE: &str = "data-weft-bind";

/// Turns component trees into HTML fragments.
///
/// Cheap to clone; clones share the template environment and the registry.
#[derive(Clone)]
pub struct RenderEngine {
    inner: Arc<Inner>,
}

struct Inner {
    env: Environment<'static>,
    registry: Registry,
}

impl RenderEngine {
    /// Create an engine that identifies components through `registry`.
    pub fn new(registry: Registry) -> Self {
        let mut env = Environment::new();
        env.set_auto_escape_callback(|_| AutoEscape::Html);
        Self {
            inner: Arc::new(Inner { env, registry }),
        }
    }

    /// The registry rendered components are entered into.
    pub fn registry(&self) -> &Registry {
        &self.inner.registry
    }

    /// Render a typed component handle.
    pub fn render_live<C: Component>(&self, component: &Live<C>) -> Result<String, RenderError> {
        self.render(&component.to_dyn())
    }

    /// Render a component and everything it references.
    ///
    /// The result is wrapped in a container carrying the component's registry
    /// identifier. Any failure, in this component or any sub-component,
    /// aborts the whole render.
    pub fn render(&self, component: &ComponentRef) -> Result<String, RenderError> {
        let id = self.inner.registry.identify(component);
        let _scope = RenderScope::enter(id)?;

        // Snapshot under the read lock, then release it before executing the
        // template so sub-component renders never nest locks.
        let snapshot = component.read().snapshot();

        let source = self.expand_markers(id, &snapshot)?;
        let failure = Arc::new(Mutex::new(None));
        let ctx = self.context(id, snapshot.values, &snapshot.handlers, &failure);

        let body = self
            .inner
            .env
            .render_named_str(snapshot.type_name, &source, ctx)
            .map_err(|source| {
                // A sub-component failure is reported as itself, not as the
                // template call that triggered it.
                if let Some(nested) = failure.lock().take() {
                    return nested;
                }
                let component = format!("{}#{id}", snapshot.type_name);
                if source.kind() == ErrorKind::SyntaxError {
                    RenderError::Parse { component, source }
                } else {
                    RenderError::Execute { component, source }
                }
            })?;

        Ok(format!(r#"<div {ID_ATTRIBUTE}="{id}">{body}</div>"#))
    }

    fn expand_markers(&self, id: ComponentId, snapshot: &Snapshot) -> Result<String, RenderError> {
        let unknown = |event: &str, name: &str, expected: &'static str| RenderError::UnknownBinding {
            component: format!("{}#{id}", snapshot.type_name),
            event: event.to_owned(),
            name: name.to_owned(),
            expected,
        };

        markers::rewrite(&snapshot.template, |marker| match marker {
            Marker::Event { event, handler } => {
                if !snapshot.handlers.contains(&handler) {
                    return Err(unknown(event, handler, "handler"));
                }
                Ok(format!(r#"on{event}="{}""#, send_expression(id, handler)))
            }
            Marker::Value { field } => {
                if !snapshot.fields.contains(&field) {
                    return Err(unknown("value", field, "field"));
                }
                Ok(format!(
                    r#"{BIND_ATTRIBUTE}="{id}.{field}" value="{{{{ {field} }}}}" onkeyup="sendSetAttribute('{id}', '{field}', this)""#
                ))
            }
        })
    }

    fn context(
        &self,
        id: ComponentId,
        values: Vec<(&'static str, Value)>,
        handlers: &[&'static str],
        failure: &Arc<Mutex<Option<RenderError>>>,
    ) -> Value {
        let mut vars: HashMap<&'static str, Value> = handlers
            .iter()
            .map(|name| (*name, Value::from_safe_string(send_expression(id, name))))
            .collect();
        vars.extend(values);

        let engine = self.clone();
        let failure = Arc::clone(failure);
        let render = Value::from_function(move |child: Value| -> Result<Value, minijinja::Error> {
            let Some(ChildValue(component)) = child.downcast_object_ref::<ChildValue>() else {
                return Err(minijinja::Error::new(
                    ErrorKind::InvalidOperation,
                    "render() expects a sub-component",
                ));
            };
            match engine.render(component) {
                Ok(html) => Ok(Value::from_safe_string(html)),
                Err(err) => {
                    let detail = err.to_string();
                    failure.lock().get_or_insert(err);
                    Err(minijinja::Error::new(ErrorKind::InvalidOperation, detail))
                }
            }
        });
        vars.insert("render", render);

        Value::from_object(RenderContext { vars })
    }
}

impl std::fmt::Debug for RenderEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RenderEngine")
            .field("registry", &self.inner.registry)
            .finish_non_exhaustive()
    }
}

/// The client-side expression that sends `<id>.<handler>` for an element.
pub fn send_expression(id: ComponentId, handler: &str) -> String {
    format!("send('{id}.{handler}', this)")
}

/// Template variables for one component render.
#[derive(Debug)]
struct RenderContext {
    vars: HashMap<&'static str, Value>,
}

impl Object for RenderContext {
    fn repr(self: &Arc<Self>) -> ObjectRepr {
        ObjectRepr::Map
    }

    fn get_value(self: &Arc<Self>, key: &Value) -> Option<Value> {
        self.vars.get(key.as_str()?).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::component::{child, children, Handler, Schema};
    use std::borrow::Cow;
    use std::sync::OnceLock;

    struct Counter {
        number: i64,
    }

    impl Component for Counter {
        fn template(&self) -> Cow<'static, str> {
            Cow::Borrowed(r#"Counter: {{ Number }} <button @click="AddOne">+</button>"#)
        }

        fn schema() -> &'static Schema<Self> {
            static SCHEMA: OnceLock<Schema<Counter>> = OnceLock::new();
            SCHEMA.get_or_init(|| {
                Schema::new()
                    .field("Number", |c: &Counter| c.number, |c, v| c.number = v)
                    .handler("AddOne", Handler::Nullary(|c| c.number += 1))
            })
        }
    }

    struct Greeter {
        name: String,
        template: &'static str,
    }

    impl Component for Greeter {
        fn template(&self) -> Cow<'static, str> {
            Cow::Borrowed(self.template)
        }

        fn schema() -> &'static Schema<Self> {
            static SCHEMA: OnceLock<Schema<Greeter>> = OnceLock::new();
            SCHEMA.get_or_init(|| {
                Schema::new()
                    .field("Name", |g: &Greeter| g.name.clone(), |g, v| g.name = v)
                    .handler("Greet", Handler::Nullary(|_| {}))
            })
        }
    }

    fn greeter(template: &'static str) -> Live<Greeter> {
        Live::new(Greeter {
            name: "Ada".into(),
            template,
        })
    }

    struct Panel {
        counters: Vec<Live<Counter>>,
        featured: Live<Counter>,
    }

    impl Component for Panel {
        fn template(&self) -> Cow<'static, str> {
            Cow::Borrowed(
                "{% for c in Counters %}<p>{{ render(c) }}</p>{% endfor %}<aside>{{ render(Featured) }}</aside>",
            )
        }

        fn schema() -> &'static Schema<Self> {
            static SCHEMA: OnceLock<Schema<Panel>> = OnceLock::new();
            SCHEMA.get_or_init(|| {
                Schema::new()
                    .prop("Counters", |p: &Panel| children(&p.counters))
                    .prop("Featured", |p: &Panel| child(&p.featured))
            })
        }
    }

    fn engine() -> RenderEngine {
        RenderEngine::new(Registry::new())
    }

    #[test]
    fn renders_fields_and_wraps_in_container() {
        let engine = engine();
        let counter = Live::new(Counter { number: 7 });

        let html = engine.render_live(&counter).unwrap();
        let id = counter.id().unwrap();

        assert!(html.starts_with(&format!(r#"<div data-weft-id="{id}">"#)));
        assert!(html.ends_with("</div>"));
        assert!(html.contains("Counter: 7"));
    }

    #[test]
    fn event_markers_become_send_calls() {
        let engine = engine();
        let counter = Live::new(Counter { number: 0 });

        let html = engine.render_live(&counter).unwrap();
        let id = counter.id().unwrap();

        assert!(html.contains(&format!(r#"onclick="send('{id}.AddOne', this)""#)));
        assert!(!html.contains("@click"));
    }

    #[test]
    fn value_markers_bind_two_way() {
        let engine = engine();
        let greeter = greeter(r#"<input type="text" @value="Name">"#);

        let html = engine.render_live(&greeter).unwrap();
        let id = greeter.id().unwrap();

        assert!(html.contains(&format!(r#"data-weft-bind="{id}.Name""#)));
        assert!(html.contains(r#"value="Ada""#));
        assert!(html.contains(&format!(r#"onkeyup="sendSetAttribute('{id}', 'Name', this)""#)));
    }

    #[test]
    fn handlers_are_exposed_as_send_expressions() {
        let engine = engine();
        let greeter = greeter(r#"<a onclick="{{ Greet }}">hi</a>"#);

        let html = engine.render_live(&greeter).unwrap();
        let id = greeter.id().unwrap();

        assert!(html.contains(&format!(r#"<a onclick="send('{id}.Greet', this)">"#)));
    }

    #[test]
    fn field_values_are_html_escaped() {
        let engine = engine();
        let greeter = greeter("<b>{{ Name }}</b>");
        greeter.write().name = "<script>\"x\"</script>".into();

        let html = engine.render_live(&greeter).unwrap();
        assert!(!html.contains("<script>"));
        assert!(html.contains("&lt;script&gt;"));
    }

    #[test]
    fn ids_are_stable_across_renders() {
        let engine = engine();
        let counter = Live::new(Counter { number: 0 });

        let first = engine.render_live(&counter).unwrap();
        counter.write().number = 1;
        let second = engine.render_live(&counter).unwrap();

        let id = counter.id().unwrap();
        let container = format!(r#"data-weft-id="{id}""#);
        assert!(first.contains(&container));
        assert!(second.contains(&container));
    }

    #[test]
    fn sub_components_render_with_their_own_ids() {
        let engine = engine();
        let panel = Live::new(Panel {
            counters: vec![
                Live::new(Counter { number: 1 }),
                Live::new(Counter { number: 2 }),
            ],
            featured: Live::new(Counter { number: 9 }),
        });

        let html = engine.render_live(&panel).unwrap();
        let panel_id = panel.id().unwrap();

        let guard = panel.read();
        let ids: Vec<_> = guard
            .counters
            .iter()
            .chain(std::iter::once(&guard.featured))
            .map(|c| c.id().expect("child rendered"))
            .collect();

        assert!(!ids.contains(&panel_id));
        for (id, number) in ids.iter().zip([1, 2, 9]) {
            assert!(html.contains(&format!(r#"<div data-weft-id="{id}">Counter: {number} "#)));
            assert!(html.contains(&format!("send('{id}.AddOne', this)")));
            assert!(engine.registry().resolve(*id).is_some());
        }
        // Child markup is spliced in unescaped.
        assert!(html.contains("<p><div data-weft-id="));
    }

    #[test]
    fn unknown_bindings_are_rejected() {
        let engine = engine();

        let err = engine.render_live(&greeter(r#"<b @click="Missing">"#)).unwrap_err();
        assert!(matches!(err, RenderError::UnknownBinding { expected: "handler", .. }));

        let err = engine.render_live(&greeter(r#"<input @value="Missing">"#)).unwrap_err();
        assert!(matches!(err, RenderError::UnknownBinding { expected: "field", .. }));
    }

    #[test]
    fn malformed_markers_are_render_errors() {
        let err = engine().render_live(&greeter("<b @click=Greet>")).unwrap_err();
        assert!(matches!(err, RenderError::Marker { .. }));
    }

    #[test]
    fn template_syntax_errors_are_parse_errors() {
        let err = engine().render_live(&greeter("{% if Name %}unclosed")).unwrap_err();
        assert!(matches!(err, RenderError::Parse { .. }), "{err:?}");
    }

    #[test]
    fn execution_errors_are_reported() {
        let err = engine().render_live(&greeter("{{ render(Name) }}")).unwrap_err();
        assert!(matches!(err, RenderError::Execute { .. }), "{err:?}");
    }

    struct Broken;

    impl Component for Broken {
        fn template(&self) -> Cow<'static, str> {
            Cow::Borrowed("<b @click=oops>")
        }

        fn schema() -> &'static Schema<Self> {
            static SCHEMA: OnceLock<Schema<Broken>> = OnceLock::new();
            SCHEMA.get_or_init(Schema::new)
        }
    }

    struct Holder {
        inner: Live<Broken>,
    }

    impl Component for Holder {
        fn template(&self) -> Cow<'static, str> {
            Cow::Borrowed("ok {{ render(Inner) }}")
        }

        fn schema() -> &'static Schema<Self> {
            static SCHEMA: OnceLock<Schema<Holder>> = OnceLock::new();
            SCHEMA.get_or_init(|| Schema::new().prop("Inner", |h: &Holder| child(&h.inner)))
        }
    }

    #[test]
    fn sub_component_failure_aborts_whole_tree() {
        let holder = Live::new(Holder {
            inner: Live::new(Broken),
        });

        let err = engine().render_live(&holder).unwrap_err();
        assert!(matches!(err, RenderError::Marker { .. }), "{err:?}");
        assert_eq!(RenderScope::depth(), 0);
    }
}
