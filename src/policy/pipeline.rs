//
// Copyright (c) 2020-2022 science+computing ag and other contributors
//
// This program and the accompanying materials are made
// available under the terms of the Eclipse Public License 2.0
// which is available at https://www.eclipse.org/legal/epl-2.0/
//
// SPDX-License-Identifier: EPL-2.0
//


use tracing::debug;
use tracing::trace;

use crate::model::OrganizerId;
use crate::policy::rules;
use crate::policy::AccessOptions;
use crate::policy::Decision;
use crate::policy::DenialKind;
use crate::policy::Intent;
use crate::policy::ResourceState;
use crate::policy::Role;

/// The state a single access check is evaluated on
///
/// Rules may lower `effective_role`, `role` always stays what the role resolver said.
#[derive(Clone, Debug)]
pub struct PolicyContext<'a> {
    pub role: Role,
    pub effective_role: Role,
    pub organizer_ids: &'a [OrganizerId],
    pub state: &'a ResourceState,
    pub intent: Intent,
    pub options: AccessOptions,
}

impl<'a> PolicyContext<'a> {
    pub fn new(
        role: Role,
        organizer_ids: &'a [OrganizerId],
        state: &'a ResourceState,
        intent: Intent,
        options: AccessOptions,
    ) -> Self {
        PolicyContext {
            role,
            effective_role: role,
            organizer_ids,
            state,
            intent,
            options,
        }
    }
}

pub trait Rule: Send + Sync {
    /// `None` - no opinion, ask the next rule
    fn evaluate(&self, cx: &mut PolicyContext<'_>) -> Option<Decision>;

    fn name(&self) -> &'static str;

    fn description(&self) -> &'static str;
}

/// A decision and the rule that made it
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Verdict {
    pub decision: Decision,
    pub rule: &'static str,
}

/// Ordered list of rules, the first rule with an opinion decides
pub struct Policy {
    rules: Vec<Box<dyn Rule>>,
}

impl Policy {
    pub fn builder() -> PolicyBuilder {
        PolicyBuilder { rules: Vec::new() }
    }

    /// The rule order every access check uses:
    /// privileged roles, organizer override, restriction, existence,
    /// run visibility, registration, participants, guests, deny.
    pub fn standard() -> Policy {
        let mut builder = Policy::builder();
        builder
            .add_rule(Box::new(rules::PrivilegedRule))
            .add_rule(Box::new(rules::OrganizerRule))
            .add_rule(Box::new(rules::RestrictedRule))
            .add_rule(Box::new(rules::ExistenceRule))
            .add_rule(Box::new(rules::RunVisibilityRule))
            .add_rule(Box::new(rules::RegistrationRule))
            .add_rule(Box::new(rules::ParticipantRule))
            .add_rule(Box::new(rules::GuestRule))
            .add_rule(Box::new(rules::DenyRule));
        builder.build()
    }

    pub fn rule_names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.rules.iter().map(|r| r.name())
    }

    pub fn authorize(&self, mut cx: PolicyContext<'_>) -> Verdict {
        trace!("Authorizing: role = {}, intent = {}, options = {:?}", cx.role, cx.intent, cx.options);
        for rule in self.rules.iter() {
            if let Some(decision) = rule.evaluate(&mut cx) {
                debug!("{}: {:?} (role = {}, effective role = {})", rule.name(), decision, cx.role, cx.effective_role);
                return Verdict { decision, rule: rule.name() }
            }
        }

        Verdict {
            decision: Decision::deny(DenialKind::Forbidden, "implicit deny: no rule approved the requested operation"),
            rule: "Implicit",
        }
    }
}

pub struct PolicyBuilder {
    rules: Vec<Box<dyn Rule>>,
}

impl PolicyBuilder {
    pub fn add_rule(&mut self, rule: Box<dyn Rule>) -> &mut Self {
        self.rules.push(rule);
        self
    }

    pub fn build(self) -> Policy {
        Policy { rules: self.rules }
    }
}

/// Decide on a request with the standard rule order
pub fn authorize(
    role: Role,
    organizer_ids: &[OrganizerId],
    state: &ResourceState,
    intent: Intent,
    options: AccessOptions,
) -> Decision {
    Policy::standard()
        .authorize(PolicyContext::new(role, organizer_ids, state, intent, options))
        .decision
}
