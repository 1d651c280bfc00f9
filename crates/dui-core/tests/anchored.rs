use std::rc::Rc;

use dui_core::widgets::anchored::AnchoredFamily;
use dui_core::{
    AnchoredConfig, AnchoredKind, AnchoredWidget, Dom, DuiError, EventKind, Family, ListenTarget,
    Markup, Offset, Placement, PositioningOptions,
};
use dui_test_support::{EngineCall, FakeDom, FakeLoader, FakeNode, fake_bridge, init_test_logging};
use futures::executor::block_on;

struct Menu {
    button: FakeNode,
    menu: FakeNode,
    item: FakeNode,
    elsewhere: FakeNode,
}

fn menu(dom: &FakeDom, button_attrs: &[(&str, &str)]) -> Menu {
    let mut attrs = vec![("id", "b1")];
    attrs.extend_from_slice(button_attrs);
    let button = dom.add(dom.root(), "button", &attrs);
    let menu = dom.add(dom.root(), "ul", &[("id", "menu1")]);
    let item = dom.add(menu, "li", &[]);
    let elsewhere = dom.add(dom.root(), "p", &[]);
    Menu {
        button,
        menu,
        item,
        elsewhere,
    }
}

#[test]
fn open_and_close_work_before_the_engine_is_ready() -> anyhow::Result<()> {
    init_test_logging();
    let dom = FakeDom::shared();
    let page = menu(&dom, &[]);
    let loader = FakeLoader::ready();
    let (bridge, engine) = fake_bridge(&loader);
    let widget = AnchoredWidget::from_selectors(
        Rc::clone(&dom),
        bridge,
        AnchoredKind::Dropdown,
        "#b1",
        "#menu1",
        AnchoredConfig::dropdown(),
    )?;
    assert!(dom.is_hidden(page.menu));
    assert!(dom.has_class(&page.menu, "hidden"));

    widget.open()?;
    assert!(widget.is_open());
    assert!(!dom.is_hidden(page.menu));
    assert!(!dom.has_class(&page.menu, "hidden"));
    assert!(!widget.is_positioned());
    assert!(engine.calls().is_empty());

    widget.spawn_positioning();
    dom.run_tasks();
    assert_eq!(loader.loads(), 1);
    assert!(widget.is_positioned());
    assert_eq!(
        engine.calls(),
        vec![
            EngineCall::Create {
                reference: page.button,
                content: page.menu,
                options: PositioningOptions {
                    placement: Placement::BottomStart,
                    offset: Offset::new(0, 5),
                },
            },
            EngineCall::Update(page.menu),
        ]
    );

    widget.close()?;
    widget.close()?;
    assert!(dom.is_hidden(page.menu));
    widget.open()?;
    assert_eq!(engine.calls().last(), Some(&EngineCall::Update(page.menu)));
    Ok(())
}

#[test]
fn outside_clicks_close_but_inside_clicks_do_not() -> anyhow::Result<()> {
    let dom = FakeDom::shared();
    let page = menu(&dom, &[]);
    let (bridge, _engine) = fake_bridge(&FakeLoader::ready());
    let widget = AnchoredWidget::new(
        Rc::clone(&dom),
        bridge,
        AnchoredKind::Popover,
        page.button,
        page.menu,
        AnchoredConfig::popover(),
    )?;

    widget.open()?;
    dom.click(page.item);
    dom.click(page.button);
    assert!(widget.is_open());

    dom.click(page.elsewhere);
    assert!(!widget.is_open());
    Ok(())
}

#[test]
fn outside_click_can_be_disabled() -> anyhow::Result<()> {
    let dom = FakeDom::shared();
    let page = menu(&dom, &[]);
    let (bridge, _engine) = fake_bridge(&FakeLoader::ready());
    let config = AnchoredConfig::dropdown().merged_json(r#"{"closeOnOutsideClick": false}"#)?;
    let widget = AnchoredWidget::new(
        Rc::clone(&dom),
        bridge,
        AnchoredKind::Dropdown,
        page.button,
        page.menu,
        config,
    )?;
    assert_eq!(dom.listener_count(), 0);
    widget.open()?;
    dom.click(page.elsewhere);
    assert!(widget.is_open());
    Ok(())
}

#[test]
fn destroy_releases_everything_once() -> anyhow::Result<()> {
    let dom = FakeDom::shared();
    let page = menu(&dom, &[]);
    let (bridge, engine) = fake_bridge(&FakeLoader::ready());
    let widget = AnchoredWidget::new(
        Rc::clone(&dom),
        bridge,
        AnchoredKind::Dropdown,
        page.button,
        page.menu,
        AnchoredConfig::dropdown(),
    )?;
    widget.spawn_positioning();
    dom.run_tasks();
    assert_eq!(engine.live(), 1);

    widget.destroy();
    widget.destroy();
    assert_eq!(engine.live(), 0);
    assert_eq!(
        engine
            .calls()
            .iter()
            .filter(|call| matches!(call, EngineCall::Destroy(_)))
            .count(),
        1
    );
    assert_eq!(dom.listeners_on(&ListenTarget::Document, EventKind::Click), 0);
    Ok(())
}

#[test]
fn destroy_before_load_skips_positioning() -> anyhow::Result<()> {
    let dom = FakeDom::shared();
    let page = menu(&dom, &[]);
    let (bridge, engine) = fake_bridge(&FakeLoader::ready());
    let widget = AnchoredWidget::new(
        Rc::clone(&dom),
        bridge,
        AnchoredKind::Dropdown,
        page.button,
        page.menu,
        AnchoredConfig::dropdown(),
    )?;
    widget.spawn_positioning();
    widget.destroy();
    dom.run_tasks();
    assert!(engine.calls().is_empty());
    assert!(!widget.is_positioned());
    Ok(())
}

#[test]
fn one_load_is_shared_by_every_waiter() -> anyhow::Result<()> {
    let dom = FakeDom::shared();
    let first = menu(&dom, &[]);
    let second_button = dom.add(dom.root(), "button", &[]);
    let second_menu = dom.add(dom.root(), "div", &[]);
    let (loader, release) = FakeLoader::gated();
    let (bridge, engine) = fake_bridge(&loader);

    let widgets = [
        AnchoredWidget::new(
            Rc::clone(&dom),
            Rc::clone(&bridge),
            AnchoredKind::Dropdown,
            first.button,
            first.menu,
            AnchoredConfig::dropdown(),
        )?,
        AnchoredWidget::new(
            Rc::clone(&dom),
            Rc::clone(&bridge),
            AnchoredKind::Popover,
            second_button,
            second_menu,
            AnchoredConfig::popover(),
        )?,
    ];
    for widget in &widgets {
        widget.spawn_positioning();
    }
    dom.run_tasks();
    assert_eq!(loader.loads(), 1);
    assert!(!bridge.is_ready());
    assert!(engine.calls().is_empty());

    release
        .send(())
        .map_err(|()| anyhow::anyhow!("loader gate already dropped"))?;
    dom.run_tasks();
    assert!(bridge.is_ready());
    assert_eq!(loader.loads(), 1);
    assert_eq!(engine.live(), 2);
    assert!(widgets.iter().all(AnchoredWidget::is_positioned));
    Ok(())
}

#[test]
fn failed_load_leaves_widgets_usable() -> anyhow::Result<()> {
    init_test_logging();
    let dom = FakeDom::shared();
    let page = menu(&dom, &[]);
    let loader = FakeLoader::failing("script blocked");
    let (bridge, engine) = fake_bridge(&loader);
    let widget = AnchoredWidget::new(
        Rc::clone(&dom),
        Rc::clone(&bridge),
        AnchoredKind::Dropdown,
        page.button,
        page.menu,
        AnchoredConfig::dropdown(),
    )?;
    widget.spawn_positioning();
    dom.run_tasks();

    let retried = block_on(widget.attach_positioning());
    assert!(matches!(retried, Err(DuiError::DependencyLoad { .. })));
    assert_eq!(loader.loads(), 1);
    assert!(!bridge.is_ready());
    assert!(engine.calls().is_empty());

    widget.toggle()?;
    assert!(widget.is_open());
    widget.toggle()?;
    assert!(!widget.is_open());
    Ok(())
}

#[test]
fn creating_before_ready_is_refused() -> anyhow::Result<()> {
    let dom = FakeDom::shared();
    let page = menu(&dom, &[]);
    let (bridge, _engine) = fake_bridge(&FakeLoader::ready());
    let options = PositioningOptions::from(&AnchoredConfig::popover());
    let result = bridge.create(&page.button, &page.menu, &options);
    assert!(matches!(result, Err(DuiError::EngineUnavailable)));
    Ok(())
}

#[test]
fn unknown_selectors_are_resolution_errors() {
    let dom = FakeDom::shared();
    menu(&dom, &[]);
    let (bridge, _engine) = fake_bridge(&FakeLoader::ready());
    let result = AnchoredWidget::from_selectors(
        Rc::clone(&dom),
        bridge,
        AnchoredKind::Popover,
        "#nobody",
        "#menu1",
        AnchoredConfig::popover(),
    );
    assert!(matches!(
        result,
        Err(DuiError::Resolution { ref selector }) if selector == "#nobody"
    ));
}

#[test]
fn family_builds_widgets_from_trigger_attributes() -> anyhow::Result<()> {
    let dom = FakeDom::shared();
    let page = menu(
        &dom,
        &[
            ("data-dui-toggle", "dropdown"),
            ("data-dui-target", "#menu1"),
            ("data-dui-placement", "top-end"),
            ("data-dui-offset", "2, 10"),
        ],
    );
    let loader = FakeLoader::ready();
    let (bridge, engine) = fake_bridge(&loader);
    let family = AnchoredFamily::new(
        Rc::clone(&dom),
        bridge,
        Markup::default(),
        AnchoredKind::Dropdown,
    );
    assert_eq!(family.scan().bound, 1);
    assert_eq!(family.instance_count(), 0);

    dom.click(page.button);
    let widget = family
        .instance(&page.button)
        .ok_or_else(|| anyhow::anyhow!("first click should create the dropdown"))?;
    assert!(widget.is_open());
    assert_eq!(widget.config().placement, Placement::TopEnd);

    dom.run_tasks();
    assert_eq!(
        engine.calls().first(),
        Some(&EngineCall::Create {
            reference: page.button,
            content: page.menu,
            options: PositioningOptions {
                placement: Placement::TopEnd,
                offset: Offset::new(2, 10),
            },
        })
    );

    dom.click(page.button);
    assert!(!widget.is_open());
    assert_eq!(family.instance_count(), 1);

    family.cleanup();
    assert_eq!(engine.live(), 0);
    assert_eq!(dom.listener_count(), 0);
    Ok(())
}

#[test]
fn popover_family_uses_popover_defaults() -> anyhow::Result<()> {
    let dom = FakeDom::shared();
    let page = menu(
        &dom,
        &[("data-dui-toggle", "popover"), ("data-dui-target", "#menu1")],
    );
    let (bridge, _engine) = fake_bridge(&FakeLoader::ready());
    let family = AnchoredFamily::new(
        Rc::clone(&dom),
        bridge,
        Markup::default(),
        AnchoredKind::Popover,
    );
    family.scan();
    family.toggle_from(&page.button)?;
    let widget = family
        .instance(&page.button)
        .ok_or_else(|| anyhow::anyhow!("toggle should create the popover"))?;
    assert_eq!(widget.kind(), AnchoredKind::Popover);
    assert_eq!(widget.config(), &AnchoredConfig::popover());
    Ok(())
}
