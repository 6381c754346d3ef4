// Copyright 2026 the Wafer Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Component definitions: declared properties, template, events and
//! lifecycle callbacks.

use core::fmt;

use hashbrown::HashMap;
use indexmap::IndexMap;
use serde_json::Value;
use wafer_dom::ShadowMode;

use crate::event::{EventBinding, EventHandler};
use crate::target::Target;
use crate::value::{PropType, normalize};
use crate::{Error, Host};

/// Property name → value before a pass or cycle, in first-observed order.
///
/// `None` means the property had no value yet.
pub type ChangeMap = IndexMap<String, Option<Value>>;

/// Callback run once per reconciliation pass with the properties that
/// changed in it. Returns the names whose targets to skip this cycle.
pub type ChangedCallback<H> =
    Box<dyn Fn(&mut H, <H as Host>::Node, &ChangeMap) -> Result<Vec<String>, Error>>;

/// Callback run after a cycle applied its targets.
pub type UpdatedCallback<H> =
    Box<dyn Fn(&mut H, <H as Host>::Node, &ChangeMap) -> Result<(), Error>>;

/// Index of a property in its [`Definition`].
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PropId(u16);

impl PropId {
    /// The position of the property in declaration order.
    #[must_use]
    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

/// A declared property.
///
/// ```rust
/// use serde_json::json;
/// use wafer_core::{Prop, PropType, Target};
/// # use wafer_core::Host;
/// # fn build<H: Host>() -> Prop<H> {
/// Prop::new(PropType::Number)
///     .initial(json!(0))
///     .reflect()
///     .target(Target::new("$#count").text())
///     .trigger("label")
/// # }
/// ```
pub struct Prop<H: Host> {
    name: String,
    ty: PropType,
    initial: Option<Value>,
    reflect: bool,
    attribute: Option<String>,
    targets: Vec<Target<H>>,
    triggers: Vec<String>,
}

impl<H: Host> fmt::Debug for Prop<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Prop")
            .field("name", &self.name)
            .field("ty", &self.ty)
            .field("initial", &self.initial)
            .field("reflect", &self.reflect)
            .field("attribute", &self.attribute)
            .field("targets", &self.targets)
            .field("triggers", &self.triggers)
            .finish()
    }
}

impl<H: Host> Prop<H> {
    /// A property of the given type with no initial value.
    #[must_use]
    pub fn new(ty: PropType) -> Self {
        Self {
            name: String::new(),
            ty,
            initial: None,
            reflect: false,
            attribute: None,
            targets: Vec::new(),
            triggers: Vec::new(),
        }
    }

    /// Value used when neither an attribute nor an earlier write supplies one.
    #[must_use]
    pub fn initial(mut self, value: impl Into<Value>) -> Self {
        self.initial = Some(normalize(value.into()));
        self
    }

    /// Mirrors the value onto the attribute.
    #[must_use]
    pub fn reflect(mut self) -> Self {
        self.reflect = true;
        self
    }

    /// Uses a different attribute name than the property name.
    #[must_use]
    pub fn attribute_name(mut self, name: impl Into<String>) -> Self {
        self.attribute = Some(name.into().to_ascii_lowercase());
        self
    }

    /// Adds a target applied whenever the value changes.
    #[must_use]
    pub fn target(mut self, target: Target<H>) -> Self {
        self.targets.push(target);
        self
    }

    /// Re-applies another property's targets whenever this one updates.
    #[must_use]
    pub fn trigger(mut self, name: impl Into<String>) -> Self {
        self.triggers.push(name.into());
        self
    }

    /// The property name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The declared type.
    #[must_use]
    pub fn ty(&self) -> PropType {
        self.ty
    }

    /// The declared initial value.
    #[must_use]
    pub fn initial_value(&self) -> Option<&Value> {
        self.initial.as_ref()
    }

    /// Whether the value is mirrored onto the attribute.
    #[must_use]
    pub fn is_reflected(&self) -> bool {
        self.reflect
    }

    /// The attribute the property reads from and reflects to.
    #[must_use]
    pub fn attribute(&self) -> &str {
        self.attribute.as_deref().unwrap_or(&self.name)
    }

    /// The targets, in declaration order.
    #[must_use]
    pub fn targets(&self) -> &[Target<H>] {
        &self.targets
    }

    /// Names of properties whose targets follow this one's.
    #[must_use]
    pub fn triggers(&self) -> &[String] {
        &self.triggers
    }
}

/// Everything that makes an element a component.
///
/// Definitions are shared between all instances of a tag. Build one with
/// [`Definition::builder`].
pub struct Definition<H: Host> {
    template: String,
    shadow: Option<ShadowMode>,
    props: Vec<Prop<H>>,
    by_name: HashMap<String, PropId>,
    by_attribute: HashMap<String, PropId>,
    events: Vec<EventBinding<H>>,
    changed: Option<ChangedCallback<H>>,
    updated: Option<UpdatedCallback<H>>,
    first_updated: Option<UpdatedCallback<H>>,
}

impl<H: Host> fmt::Debug for Definition<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Definition")
            .field("template", &self.template)
            .field("shadow", &self.shadow)
            .field("props", &self.props)
            .field("events", &self.events)
            .field("has_changed", &self.changed.is_some())
            .field("has_updated", &self.updated.is_some())
            .field("has_first_updated", &self.first_updated.is_some())
            .finish_non_exhaustive()
    }
}

impl<H: Host> Definition<H> {
    /// Starts a definition with an empty template in an open shadow root.
    #[must_use]
    pub fn builder() -> DefinitionBuilder<H> {
        DefinitionBuilder {
            template: String::new(),
            shadow: Some(ShadowMode::Open),
            props: Vec::new(),
            events: Vec::new(),
            changed: None,
            updated: None,
            first_updated: None,
        }
    }

    /// The template markup.
    #[must_use]
    pub fn template(&self) -> &str {
        &self.template
    }

    /// Shadow root mode, or `None` for light DOM.
    #[must_use]
    pub fn shadow(&self) -> Option<ShadowMode> {
        self.shadow
    }

    /// All declared properties in declaration order.
    #[must_use]
    pub fn props(&self) -> &[Prop<H>] {
        &self.props
    }

    /// Looks a property up by name.
    #[must_use]
    pub fn prop_id(&self, name: &str) -> Option<PropId> {
        self.by_name.get(name).copied()
    }

    /// Looks a property up by the attribute it observes.
    #[must_use]
    pub fn prop_for_attribute(&self, attribute: &str) -> Option<PropId> {
        self.by_attribute
            .get(attribute.to_ascii_lowercase().as_str())
            .copied()
    }

    /// Attribute names whose changes reach the component.
    pub fn observed_attributes(&self) -> impl Iterator<Item = &str> + '_ {
        self.props.iter().map(Prop::attribute)
    }

    /// Ids of all declared properties in declaration order.
    #[expect(
        clippy::cast_possible_truncation,
        reason = "bounded by `DefinitionBuilder::build`"
    )]
    pub fn prop_ids(&self) -> impl Iterator<Item = PropId> + use<H> {
        (0..self.props.len()).map(|index| PropId(index as u16))
    }

    /// The property with this id.
    ///
    /// # Panics
    ///
    /// Panics if `id` came from another definition with more properties.
    #[must_use]
    pub fn prop(&self, id: PropId) -> &Prop<H> {
        &self.props[id.index()]
    }

    /// Declared event bindings.
    #[must_use]
    pub fn events(&self) -> &[EventBinding<H>] {
        &self.events
    }

    pub(crate) fn changed(&self) -> Option<&ChangedCallback<H>> {
        self.changed.as_ref()
    }

    pub(crate) fn updated(&self) -> Option<&UpdatedCallback<H>> {
        self.updated.as_ref()
    }

    pub(crate) fn first_updated(&self) -> Option<&UpdatedCallback<H>> {
        self.first_updated.as_ref()
    }
}

/// Builder for [`Definition`].
pub struct DefinitionBuilder<H: Host> {
    template: String,
    shadow: Option<ShadowMode>,
    props: Vec<Prop<H>>,
    events: Vec<EventBinding<H>>,
    changed: Option<ChangedCallback<H>>,
    updated: Option<UpdatedCallback<H>>,
    first_updated: Option<UpdatedCallback<H>>,
}

impl<H: Host> fmt::Debug for DefinitionBuilder<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DefinitionBuilder")
            .field("template", &self.template)
            .field("shadow", &self.shadow)
            .field("props", &self.props)
            .field("events", &self.events)
            .finish_non_exhaustive()
    }
}

impl<H: Host> DefinitionBuilder<H> {
    /// Sets the template markup.
    #[must_use]
    pub fn template(mut self, html: impl Into<String>) -> Self {
        self.template = html.into();
        self
    }

    /// Stamps the template into a shadow root of this mode.
    #[must_use]
    pub fn shadow(mut self, mode: ShadowMode) -> Self {
        self.shadow = Some(mode);
        self
    }

    /// Stamps the template into the element itself.
    #[must_use]
    pub fn light(mut self) -> Self {
        self.shadow = None;
        self
    }

    /// Declares a property. A later declaration of the same name replaces an
    /// earlier one.
    #[must_use]
    pub fn prop(mut self, name: impl Into<String>, mut prop: Prop<H>) -> Self {
        prop.name = name.into();
        match self.props.iter_mut().find(|p| p.name == prop.name) {
            Some(existing) => *existing = prop,
            None => self.props.push(prop),
        }
        self
    }

    /// Declares an event handler for nodes matching `selector`.
    #[must_use]
    pub fn event(
        mut self,
        selector: impl Into<String>,
        name: impl Into<String>,
        handler: EventHandler<H>,
    ) -> Self {
        self.events.push(EventBinding::new(selector, name, handler));
        self
    }

    /// Sets the `changed` callback.
    #[must_use]
    pub fn changed(
        mut self,
        changed: impl Fn(&mut H, H::Node, &ChangeMap) -> Result<Vec<String>, Error> + 'static,
    ) -> Self {
        self.changed = Some(Box::new(changed));
        self
    }

    /// Sets the `updated` callback.
    #[must_use]
    pub fn updated(
        mut self,
        updated: impl Fn(&mut H, H::Node, &ChangeMap) -> Result<(), Error> + 'static,
    ) -> Self {
        self.updated = Some(Box::new(updated));
        self
    }

    /// Sets the `first_updated` callback.
    #[must_use]
    pub fn first_updated(
        mut self,
        first_updated: impl Fn(&mut H, H::Node, &ChangeMap) -> Result<(), Error> + 'static,
    ) -> Self {
        self.first_updated = Some(Box::new(first_updated));
        self
    }

    /// Finishes the definition.
    ///
    /// # Panics
    ///
    /// Panics if more than 65,536 properties are declared.
    #[must_use]
    pub fn build(self) -> Definition<H> {
        assert!(
            self.props.len() <= usize::from(u16::MAX) + 1,
            "Too many properties declared (max {})",
            usize::from(u16::MAX) + 1
        );
        let mut by_name = HashMap::with_capacity(self.props.len());
        let mut by_attribute = HashMap::with_capacity(self.props.len());
        for (index, prop) in self.props.iter().enumerate() {
            #[expect(clippy::cast_possible_truncation, reason = "checked above")]
            let id = PropId(index as u16);
            by_name.insert(prop.name.clone(), id);
            by_attribute.insert(prop.attribute().to_ascii_lowercase(), id);
        }
        Definition {
            template: self.template,
            shadow: self.shadow,
            props: self.props,
            by_name,
            by_attribute,
            events: self.events,
            changed: self.changed,
            updated: self.updated,
            first_updated: self.first_updated,
        }
    }
}
