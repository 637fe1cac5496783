/// Mount, update and unmount cycles driven through the stub host

use bridge_types::guard::ParamOptions;
use bridge_types::{Bag, Value, bag};
use bridge_ui::state::{STATE_UPDATED_AT, StateDecl};
use bridge_ui::{AdapterConfig, AdapterError, BufferConsole, Component, ComponentClass, StubEngine, StubHost};
use std::cell::RefCell;
use std::rc::Rc;

type Log = Rc<RefCell<Vec<String>>>;

fn init_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_test_writer()
        .try_init();
}

fn record(log: &Log, entry: &'static str) -> impl Fn(&Component) -> anyhow::Result<()> + 'static {
    let log = log.clone();
    move |_: &Component| {
        log.borrow_mut().push(entry.to_string());
        Ok(())
    }
}

fn counter() -> Rc<ComponentClass> {
    ComponentClass::builder("Counter")
        .param("label", ParamOptions::new())
        .define_state(StateDecl::new("count", 0))
        .render(|c| {
            let text = format!("{} {}", c.param("label")?, c.state("count")?.get());
            Ok(text.into())
        })
        .build()
}

/// Test the hook order across mount, a prop change and unmount
#[test]
fn test_hook_order() {
    init_logging();
    let log: Log = Rc::new(RefCell::new(Vec::new()));
    let child = ComponentClass::builder("Child")
        .after_mount(record(&log, "child after_mount"))
        .render(|_| Ok("c".into()))
        .build();

    let receive_log = log.clone();
    let before_log = log.clone();
    let after_log = log.clone();
    let parent = ComponentClass::builder("Parent")
        .param("label", ParamOptions::new())
        .before_mount(record(&log, "before_mount"))
        .after_mount(record(&log, "after_mount"))
        .before_receive_props(move |_, props| {
            receive_log
                .borrow_mut()
                .push(format!("before_receive_props {}", props["label"]));
            Ok(())
        })
        .before_update(move |_, next| {
            before_log
                .borrow_mut()
                .push(format!("before_update {}", next.props["label"]));
            Ok(())
        })
        .after_update(move |_, prev| {
            after_log
                .borrow_mut()
                .push(format!("after_update {}", prev.props["label"]));
            Ok(())
        })
        .before_unmount(record(&log, "before_unmount"))
        .render(move |c| {
            let label = c.param("label")?;
            let div = c.render_with("div", Bag::new(), || {
                c.present(&child, Bag::new())?;
                Ok(label.into())
            })?;
            Ok(div.into())
        })
        .build();

    let host = StubHost::new();
    let handle = host.mount(&host.create_element(&parent, bag! { "label" => "a" })).unwrap();
    assert_eq!(host.markup(handle), "<div><span>c</span>a</div>");

    assert!(host.update_props(handle, bag! { "label" => "b" }).unwrap());
    assert_eq!(host.markup(handle), "<div><span>c</span>b</div>");

    host.unmount(handle).unwrap();
    assert_eq!(
        *log.borrow(),
        vec![
            "before_mount",
            "child after_mount",
            "after_mount",
            "before_receive_props b",
            "before_update b",
            "child after_mount",
            "after_update a",
            "before_unmount",
        ]
    );
    assert!(host.engine().is_empty());
}

/// Test that identical params skip the re-render
#[test]
fn test_identical_params_skip_update() {
    let host = StubHost::new();
    let handle = host.mount(&host.create_element(&counter(), bag! { "label" => "n" })).unwrap();

    assert!(!host.update_props(handle, bag! { "label" => "n" }).unwrap());
    assert!(host.update_props(handle, bag! { "label" => "m" }).unwrap());
    assert_eq!(host.markup(handle), "<span>m 0</span>");
}

/// Test that a state write re-renders the owner on the next flush
#[test]
fn test_state_write_rerenders_owner() {
    init_logging();
    let host = StubHost::new();
    let handle = host.mount(&host.create_element(&counter(), bag! { "label" => "n" })).unwrap();
    let component = host.component(handle).unwrap();
    assert_eq!(host.markup(handle), "<span>n 0</span>");

    component.state("count").unwrap().set(1).unwrap();
    assert_eq!(host.flush().unwrap(), 1);
    assert_eq!(host.markup(handle), "<span>n 1</span>");
    assert_eq!(host.flush().unwrap(), 0);
}

/// Test the engine calls made for a mount and a state write
#[test]
fn test_engine_call_log() {
    let buffer = Rc::new(RefCell::new(Vec::new()));
    let engine = Rc::new(StubEngine::with_buffer(buffer.clone()));
    let host = StubHost::with_engine(engine, AdapterConfig::default(), Rc::new(BufferConsole::new()));

    let handle = host.mount(&host.create_element(&counter(), bag! { "label" => "n" })).unwrap();
    host.component(handle).unwrap().state("count").unwrap().set(5).unwrap();
    host.unmount(handle).unwrap();

    assert_eq!(
        *buffer.borrow(),
        vec![
            "create #1",
            "replace_state #1 [\"count\"]",
            "merge_state #1 [\"***_state_updated_at-***\", \"count\"]",
            "destroy #1",
        ]
    );
}

#[test]
fn test_should_update_on_changed_params() {
    let host = StubHost::new();
    let handle = host.mount(&host.create_element(&counter(), bag! { "label" => "n" })).unwrap();
    let component = host.component(handle).unwrap();
    let state = component.native_state().unwrap();

    assert!(component.should_update(&bag! { "label" => "m" }, state.as_ref()).unwrap());
    assert!(component.should_update(&bag! { "label" => "n", "extra" => 1 }, state.as_ref()).unwrap());
    assert!(!component.should_update(&component.params().unwrap(), state.as_ref()).unwrap());
}

/// Only the update timestamp is compared, not the rest of the state
#[test]
fn test_should_update_compares_timestamps() {
    let host = StubHost::new();
    let handle = host.mount(&host.create_element(&counter(), bag! { "label" => "n" })).unwrap();
    let component = host.component(handle).unwrap();
    let params = component.params().unwrap();

    component.set_state(bag! { STATE_UPDATED_AT => 7 }).unwrap();
    host.engine().commit(handle);

    let same_stamp = bag! { "count" => 99, STATE_UPDATED_AT => 7 };
    let new_stamp = bag! { "count" => 0, STATE_UPDATED_AT => 8 };
    let no_stamp = bag! { "count" => 0 };
    assert!(!component.should_update(&params, Some(&same_stamp)).unwrap());
    assert!(component.should_update(&params, Some(&new_stamp)).unwrap());
    assert!(component.should_update(&params, Some(&no_stamp)).unwrap());
}

#[test]
fn test_should_update_when_one_state_is_absent() {
    let host = StubHost::new();
    let stateless = ComponentClass::builder("Stateless").render(|_| Ok("".into())).build();
    let handle = host.mount(&host.create_element(&stateless, Bag::new())).unwrap();
    let component = host.component(handle).unwrap();

    assert_eq!(component.native_state().unwrap(), None);
    assert!(component.should_update(&Bag::new(), Some(&bag! { "x" => 1 })).unwrap());
    assert!(!component.should_update(&Bag::new(), None).unwrap());
}

/// A `needs_update` override decides alone, and its errors are not swallowed
#[test]
fn test_needs_update_override_is_authoritative() {
    let host = StubHost::new();
    let never = ComponentClass::subclass(&counter(), "Never")
        .needs_update(|_, _| Ok(false))
        .build();
    let failing = ComponentClass::subclass(&counter(), "Failing")
        .needs_update(|_, _| Err(anyhow::anyhow!("cannot decide")))
        .build();

    let handle = host.mount(&host.create_element(&never, bag! { "label" => "n" })).unwrap();
    assert!(!host.update_props(handle, bag! { "label" => "m" }).unwrap());
    assert_eq!(host.markup(handle), "<span>n 0</span>");

    let handle = host.mount(&host.create_element(&failing, bag! { "label" => "n" })).unwrap();
    let error = host.update_props(handle, bag! { "label" => "m" }).unwrap_err();
    assert!(matches!(error, AdapterError::HookFailed { .. }));
}

#[test]
fn test_force_update_config_always_rerenders() {
    let config = AdapterConfig {
        force_update: true,
        ..AdapterConfig::default()
    };
    let host = StubHost::with_config(config, Rc::new(BufferConsole::new()));
    let handle = host.mount(&host.create_element(&counter(), bag! { "label" => "n" })).unwrap();

    assert!(host.update_props(handle, bag! { "label" => "n" }).unwrap());
}

#[test]
fn test_force_update_bypasses_should_update() {
    let host = StubHost::new();
    let renders = Rc::new(RefCell::new(0));
    let count = renders.clone();
    let class = ComponentClass::builder("Clock")
        .render(move |_| {
            *count.borrow_mut() += 1;
            Ok("tick".into())
        })
        .build();

    let handle = host.mount(&host.create_element(&class, Bag::new())).unwrap();
    host.component(handle).unwrap().force_update().unwrap();
    assert_eq!(host.flush().unwrap(), 1);
    assert_eq!(*renders.borrow(), 2);
}

/// Children mount first, so their `after_mount` runs before the parent's
#[test]
fn test_did_mount_runs_children_first() {
    let log: Log = Rc::new(RefCell::new(Vec::new()));
    let leaf = ComponentClass::builder("Leaf")
        .after_mount(record(&log, "leaf"))
        .render(|_| Ok("".into()))
        .build();
    let branch = ComponentClass::builder("Branch")
        .after_mount(record(&log, "branch"))
        .render(move |c| Ok(c.present(&leaf, Bag::new())?.into()))
        .build();
    let root = ComponentClass::builder("Root")
        .after_mount(record(&log, "root"))
        .render(move |c| Ok(c.present(&branch, Bag::new())?.into()))
        .build();

    let host = StubHost::new();
    host.mount(&host.create_element(&root, Bag::new())).unwrap();
    assert_eq!(*log.borrow(), vec!["leaf", "branch", "root"]);
}

/// A failing `before_unmount` is reported and the instance is still released
#[test]
fn test_unmount_cleans_up_after_failure() {
    let console = BufferConsole::new();
    let host = StubHost::with_console(Rc::new(console.clone()));
    let class = ComponentClass::builder("Sticky")
        .define_state(StateDecl::new("open", true))
        .backtrace(false)
        .before_unmount(|_| Err(anyhow::anyhow!("still busy")))
        .render(|_| Ok("".into()))
        .build();

    let handle = host.mount(&host.create_element(&class, Bag::new())).unwrap();
    let component = host.component(handle).unwrap();
    let store = host.runtime().store().clone();
    assert!(store.has_owner(&component.owner()));

    host.unmount(handle).unwrap();

    assert_eq!(console.errors(), vec!["Exception raised while rendering #<Sticky:1>: still busy"]);
    assert_eq!(component.native_handle(), None);
    assert!(!store.has_owner(&component.owner()));
    assert!(host.component(handle).is_none());
    assert_eq!(store.peek(&component.owner(), "open"), Value::Nil);
}

/// State access after unmount fails instead of recreating the released entry
#[test]
fn test_state_access_after_unmount_fails() {
    let host = StubHost::new();
    let holder = ComponentClass::builder("Holder")
        .define_state(StateDecl::new("field", 1))
        .render(|c| Ok(c.state("field")?.get().into()))
        .build();
    let handle = host.mount(&host.create_element(&holder, Bag::new())).unwrap();
    let component = host.component(handle).unwrap();
    let field = component.state("field").unwrap();
    let store = host.runtime().store().clone();

    host.unmount(handle).unwrap();

    let error = component.state("field").err().map(|e| e.to_string());
    assert_eq!(error.as_deref(), Some("No native ReactComponent associated with #<Holder:1>"));
    assert!(matches!(
        component.define_state(StateDecl::new("other", 0)),
        Err(AdapterError::NoNativeComponent { .. })
    ));
    assert!(matches!(field.set(9), Err(AdapterError::StateReleased { .. })));
    assert!(matches!(field.update(9), Err(AdapterError::StateReleased { .. })));
    assert!(!store.has_owner(&component.owner()));

    field.observe().set(9);
    assert!(!store.has_owner(&component.owner()));
}

#[test]
fn test_mount_rejects_plain_tags() {
    let host = StubHost::new();
    let error = host
        .mount(&bridge_ui::Element::tag("div", Bag::new(), Vec::new()))
        .unwrap_err();
    assert!(matches!(error, AdapterError::NotMountable(_)));
}
