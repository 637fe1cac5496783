/// Class inheritance, name dispatch, children and the native API surface

use bridge_types::guard::ParamOptions;
use bridge_types::{Bag, Callback, Value, bag};
use bridge_ui::{AdapterError, BufferConsole, ComponentClass, Content, Dispatched, StubHost};
use std::cell::RefCell;
use std::rc::Rc;

fn host() -> (StubHost, BufferConsole) {
    let console = BufferConsole::new();
    (StubHost::with_console(Rc::new(console.clone())), console)
}

fn joined(value: &Value) -> String {
    value
        .as_array()
        .unwrap_or_default()
        .iter()
        .map(Value::to_display_string)
        .collect::<Vec<_>>()
        .join(" ")
}

fn foo_class() -> Rc<ComponentClass> {
    ComponentClass::builder("Foo")
        .before_mount(|c| {
            c.state("instance_data")?.set(vec![Value::from("working")])?;
            Ok(())
        })
        .render(|c| Ok(joined(&c.state("instance_data")?.get()).into()))
        .build()
}

/// A plain component renders through its hooks
#[test]
fn test_base_component_renders() {
    let (host, _) = host();
    let foo = foo_class();

    let markup = host.render_to_static_markup(&host.create_element(&foo, Bag::new())).unwrap();
    assert_eq!(markup, "<span>working</span>");
}

/// A subclass runs the parent's hooks first, then its own
#[test]
fn test_subclass_inherits_hooks_and_render() {
    let (host, _) = host();
    let foo = foo_class();
    let bar = ComponentClass::subclass(&foo, "Bar")
        .before_mount(|c| {
            c.state("instance_data")?.observe().modify(|value| {
                if let Value::Array(items) = value {
                    items.push(Value::from("well"));
                }
            });
            Ok(())
        })
        .build();

    assert_eq!(bar.parent(), Some("Foo"));
    let markup = host.render_to_static_markup(&host.create_element(&bar, Bag::new())).unwrap();
    assert_eq!(markup, "<span>working well</span>");
}

/// Names resolve from the innermost scope of the calling class outwards
#[test]
fn test_nested_component_resolution() {
    let (host, _) = host();
    let inner = ComponentClass::builder("Outer::Inner")
        .render(|c| Ok(c.render("Sibling", Bag::new())?.into()))
        .build();
    let nested_sibling = ComponentClass::builder("Outer::Sibling")
        .render(|_| Ok("nested".into()))
        .build();
    let global_sibling = ComponentClass::builder("Sibling")
        .render(|_| Ok("global".into()))
        .build();
    for class in [&inner, &nested_sibling, &global_sibling] {
        host.register(class);
    }

    let markup = host.render_to_static_markup(&host.create_element(&inner, Bag::new())).unwrap();
    assert_eq!(markup, "<span>nested</span>");
}

/// Unknown names check params, then tags, then component classes
#[test]
fn test_dispatch_prefers_params() {
    let (host, _) = host();
    let seen = Rc::new(RefCell::new(Vec::new()));
    let log = seen.clone();
    let foo = ComponentClass::builder("Foo")
        .param("title", ParamOptions::new())
        .render(move |c| {
            if let Dispatched::Param(title) = c.dispatch("title", Bag::new(), None)? {
                log.borrow_mut().push(format!("param {}", title));
            }
            if let Err(error) = c.dispatch("nope", Bag::new(), None) {
                log.borrow_mut().push(error.to_string());
            }
            let element = c.dispatch("div", bag! { "className" => "title" }, None)?;
            Ok(element.into_element().map(Content::from).unwrap_or(Content::Empty))
        })
        .build();

    let markup = host
        .render_to_static_markup(&host.create_element(&foo, bag! { "title" => "hello" }))
        .unwrap();
    assert_eq!(markup, "<div class=\"title\"></div>");
    assert_eq!(
        *seen.borrow(),
        vec!["param hello", "undefined method `nope` for #<Foo:1>"]
    );
}

/// A `_as_node` element is built but only attached where it is inserted
#[test]
fn test_as_node_suffix_builds_without_attaching() {
    let (host, _) = host();
    let foo = ComponentClass::builder("Foo")
        .render(|c| {
            let icon = c.render("i_as_node", bag! { "className" => "icon" })?;
            let div = c.render_with("div", Bag::new(), || {
                c.render_with("b", Bag::new(), || Ok("label".into()))?;
                c.insert(&icon)?;
                Ok(Content::Empty)
            })?;
            Ok(div.into())
        })
        .build();

    let markup = host.render_to_static_markup(&host.create_element(&foo, Bag::new())).unwrap();
    assert_eq!(markup, "<div><b>label</b><i class=\"icon\"></i></div>");
}

/// Children built in a block are handed to the child component through the
/// engine
#[test]
fn test_children_are_passed_through() {
    let (host, _) = host();
    let list = ComponentClass::builder("List")
        .render(|c| {
            let children = c.children()?;
            assert_eq!(children.len(), 2);
            let ul = c.render_with("ul", Bag::new(), || {
                for child in &children {
                    c.insert(&child)?;
                }
                Ok(Content::Empty)
            })?;
            Ok(ul.into())
        })
        .build();
    let list_class = list.clone();
    let page = ComponentClass::builder("Page")
        .render(move |c| {
            let element = c.present_with(&list_class, Bag::new(), || {
                c.render_with("li", Bag::new(), || Ok("a".into()))?;
                c.render_with("li", Bag::new(), || Ok("b".into()))?;
                Ok(Content::Empty)
            })?;
            Ok(element.into())
        })
        .build();

    let markup = host.render_to_static_markup(&host.create_element(&page, Bag::new())).unwrap();
    assert_eq!(markup, "<ul><li>a</li><li>b</li></ul>");
}

/// `emit` calls the `_on<Event>` proc param
#[test]
fn test_emit_calls_camelized_handler() {
    let (host, _) = host();
    let events = Rc::new(RefCell::new(Vec::new()));
    let sink = events.clone();
    let handler = Callback::new(move |args| {
        sink.borrow_mut().push(args.to_vec());
        Value::Nil
    });
    let missing = Rc::new(RefCell::new(None));
    let missing_sink = missing.clone();

    let input = ComponentClass::builder("Input")
        .before_mount(move |c| {
            c.emit("value_changed", &[Value::from("x")])?;
            *missing_sink.borrow_mut() = c.emit("blur", &[]).err().map(|e| e.to_string());
            Ok(())
        })
        .render(|_| Ok("".into()))
        .build();

    host.render_to_static_markup(&host.create_element(&input, bag! { "_onValueChanged" => handler }))
        .unwrap();

    assert_eq!(*events.borrow(), vec![vec![Value::from("x")]]);
    assert_eq!(
        missing.borrow().as_deref(),
        Some("undefined method `_onBlur` for #<Input:1>")
    );
}

/// Native calls fail with a descriptive error once the handle is gone
#[test]
fn test_native_api_requires_a_handle() {
    let (host, _) = host();
    let foo = ComponentClass::builder("Foo").render(|_| Ok("hi".into())).build();

    let handle = host.mount(&host.create_element(&foo, Bag::new())).unwrap();
    let component = host.component(handle).unwrap();
    assert_eq!(component.native().unwrap(), handle);
    assert!(component.is_mounted().unwrap());

    host.unmount(handle).unwrap();

    let error = component.force_update().unwrap_err();
    assert!(matches!(error, AdapterError::NoNativeComponent { .. }));
    assert_eq!(error.to_string(), "No native ReactComponent associated with #<Foo:1>");
    assert!(component.set_state(bag! { "a" => 1 }).is_err());
    assert!(component.params().is_err());
}

/// Render errors are reported with the error chain and render nothing
#[test]
fn test_render_error_is_reported() {
    let (host, console) = host();
    let foo = ComponentClass::builder("Foo")
        .render(|_| Err(anyhow::anyhow!("bad render")))
        .build();

    let markup = host.render_to_static_markup(&host.create_element(&foo, Bag::new())).unwrap();
    assert_eq!(markup, "");
    assert_eq!(
        console.errors(),
        vec!["Exception raised while rendering #<Foo:1>\n    bad render"]
    );
}

/// With backtraces off only the top-level message is logged
#[test]
fn test_backtrace_off_logs_one_line() {
    let (host, console) = host();
    let foo = ComponentClass::builder("Foo")
        .backtrace(false)
        .before_mount(|_| Err(anyhow::anyhow!("boom")))
        .render(|_| Ok("still renders".into()))
        .build();

    let markup = host.render_to_static_markup(&host.create_element(&foo, Bag::new())).unwrap();
    assert_eq!(markup, "<span>still renders</span>");
    assert_eq!(console.errors(), vec!["Exception raised while rendering #<Foo:1>: boom"]);
}

/// A re-raising class turns the reported error into a failure
#[test]
fn test_reraise_propagates_hook_errors() {
    let (host, console) = host();
    let foo = ComponentClass::builder("Foo")
        .reraise(true)
        .before_mount(|_| Err(anyhow::anyhow!("boom")))
        .render(|_| Ok("".into()))
        .build();

    let error = host.mount(&host.create_element(&foo, Bag::new())).unwrap_err();
    assert!(matches!(error, AdapterError::HookFailed { .. }));
    assert_eq!(console.errors().len(), 1);
}

/// A render that leaves two elements at the root is rejected
#[test]
fn test_render_must_return_one_element() {
    let (host, console) = host();
    let foo = ComponentClass::builder("Foo")
        .backtrace(false)
        .render(|c| {
            c.render("div", Bag::new())?;
            Ok(c.render("div", Bag::new())?.into())
        })
        .build();

    host.render_to_static_markup(&host.create_element(&foo, Bag::new())).unwrap();
    assert_eq!(
        console.errors(),
        vec![
            "Exception raised while rendering #<Foo:1>: a components render method must generate \
             and return exactly 1 element or a string"
        ]
    );
}
