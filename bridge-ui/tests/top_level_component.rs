/// Finding the component a controller asked for by name

use bridge_types::{Bag, bag};
use bridge_ui::{AdapterError, ComponentClass, StubHost};

fn named(name: &str) -> std::rc::Rc<ComponentClass> {
    ComponentClass::builder(name)
        .render(|c| Ok(c.class().name().into()))
        .build()
}

fn host() -> StubHost {
    let host = StubHost::new();
    for name in [
        "Components::Controller::Component1",
        "Components::Component1",
        "Components::Component2",
        "Component1",
    ] {
        host.register(&named(name));
    }
    host
}

fn render(host: &StubHost, controller: &str, name: &str) -> String {
    let element = host
        .runtime()
        .top_level_element(controller, name, Bag::new())
        .unwrap();
    host.render_to_static_markup(&element).unwrap()
}

#[test]
fn test_controller_scoped_component_wins() {
    let host = host();
    assert_eq!(
        render(&host, "Controller", "Component1"),
        "<span>Components::Controller::Component1</span>"
    );
}

#[test]
fn test_falls_back_to_components_module() {
    let host = host();
    assert_eq!(
        render(&host, "Controller", "Component2"),
        "<span>Components::Component2</span>"
    );
}

#[test]
fn test_falls_back_to_top_level() {
    let host = host();
    assert_eq!(
        render(&host, "OtherController", "Component1"),
        "<span>Component1</span>"
    );
}

#[test]
fn test_absolute_name_skips_search() {
    let host = host();
    assert_eq!(
        render(&host, "Controller", "::Components::Component1"),
        "<span>Components::Component1</span>"
    );
}

#[test]
fn test_render_params_are_passed() {
    let host = host();
    let greeter = ComponentClass::builder("Greeter")
        .render(|c| Ok(format!("hi {}", c.param("who")?).into()))
        .build();
    host.register(&greeter);

    let element = host
        .runtime()
        .top_level_element("Controller", "Greeter", bag! { "who" => "there" })
        .unwrap();
    assert_eq!(host.render_to_static_markup(&element).unwrap(), "<span>hi there</span>");
}

#[test]
fn test_missing_component_lists_candidates() {
    let host = host();
    let error = host
        .runtime()
        .top_level_element("Controller", "Nope", Bag::new())
        .unwrap_err();

    assert!(matches!(error, AdapterError::ComponentNotFound { .. }));
    let message = error.to_string();
    assert!(message.starts_with("Could not find component class `Nope`"));
    assert!(message.contains("::Controller::Nope"));
    assert!(message.contains("::Components::Nope"));
}
