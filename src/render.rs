/// Plan renderer: turns menu data into a framework-agnostic UI tree.
///
/// Both front ends (ratatui and plain stdout) consume the same `Node`s, so the
/// rules about what is shown live only here.
use crate::menu::{Amount, Dish, Menu, Plan};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CardKind {
    Dish,
    ShoppingList,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Heading(String),
    /// One plan slot: title plus body.
    Section { title: String, children: Vec<Node> },
    Card { kind: CardKind, title: String, children: Vec<Node> },
    /// "label: value" line.
    Field { label: &'static str, value: String },
    /// Emphasised free text (plan notes).
    Note(String),
    OrderedList(Vec<String>),
    BulletList(Vec<String>),
    Button { label: &'static str, enabled: bool },
}

pub const COPY_LABEL: &str = "Copy list";
pub const COPIED_LABEL: &str = "Copied!";
pub const SHOPPING_LIST_TITLE: &str = "Shopping list";

pub fn render_dish(dish: &Dish) -> Node {
    let mut children = vec![
        Node::Field {
            label: "Ingredients",
            value: dish.ingredients.join(", "),
        },
        Node::Field { label: "Steps", value: String::new() },
        Node::OrderedList(dish.steps.clone()),
        Node::Field {
            label: "Calories",
            value: format!("{} kcal", dish.calories),
        },
    ];

    if let Some(n) = &dish.nutrition {
        let show = |a: &Option<Amount>| {
            a.as_ref().map(ToString::to_string).unwrap_or_else(|| "-".to_string())
        };
        children.push(Node::Field {
            label: "Nutrition",
            value: format!(
                "protein {} / fat {} / carbohydrate {}",
                show(&n.protein),
                show(&n.fat),
                show(&n.carbohydrate)
            ),
        });
    }

    Node::Card {
        kind: CardKind::Dish,
        title: dish.name.clone(),
        children,
    }
}

/// Render one plan slot. `None` for an absent plan; a plan with no dishes shows
/// only its notes.
pub fn render_plan(title: &str, plan: Option<&Plan>, copied: bool) -> Option<Node> {
    let plan = plan?;

    if plan.dishes.is_empty() {
        return Some(Node::Section {
            title: title.to_string(),
            children: vec![Node::Note(plan.notes.clone())],
        });
    }

    let mut children: Vec<Node> = plan.dishes.iter().map(render_dish).collect();
    children.push(Node::Field {
        label: "Total calories",
        value: format!("{} kcal", plan.total_calories),
    });
    children.push(Node::Note(plan.notes.clone()));

    if let Some(items) = plan.shopping_items() {
        children.push(Node::Card {
            kind: CardKind::ShoppingList,
            title: SHOPPING_LIST_TITLE.to_string(),
            children: vec![
                Node::Button {
                    label: if copied { COPIED_LABEL } else { COPY_LABEL },
                    enabled: !copied,
                },
                Node::BulletList(items.to_vec()),
            ],
        });
    }

    Some(Node::Section {
        title: title.to_string(),
        children,
    })
}

/// Whole menu: optional title heading, then every slot in order.
/// `copied(i)` reports the copy indicator of slot `i`.
pub fn render_menu(menu: &Menu, copied: impl Fn(usize) -> bool) -> Vec<Node> {
    let mut nodes = Vec::new();
    if let Some(title) = &menu.title {
        nodes.push(Node::Heading(title.clone()));
    }
    for (i, slot) in menu.slots.iter().enumerate() {
        if let Some(node) = render_plan(&slot.title, slot.plan.as_ref(), copied(i)) {
            nodes.push(node);
        }
    }
    nodes
}
