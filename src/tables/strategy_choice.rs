use std::collections::HashMap;

use log::debug;

use crate::{
    error::Error,
    name::Name,
    strategy::{
        BestRouteStrategy, MulticastStrategy, Strategy, BEST_ROUTE_STRATEGY_NAME,
        MULTICAST_STRATEGY_NAME,
    },
};

type StrategyFactory = Box<dyn Fn() -> Box<dyn Strategy>>;

/// Which strategy handles which part of the namespace.
///
/// The root prefix always has a strategy, best-route unless changed, so
/// every name resolves to one.
pub struct StrategyChoice {
    factories: Vec<(String, StrategyFactory)>,
    root: Box<dyn Strategy>,
    // Non-root prefixes only
    entries: HashMap<Name, Box<dyn Strategy>>,
}

impl StrategyChoice {
    pub fn new() -> Self {
        let mut choice = Self {
            factories: Vec::new(),
            root: Box::new(BestRouteStrategy::new()),
            entries: HashMap::new(),
        };
        choice.install(BEST_ROUTE_STRATEGY_NAME, || Box::new(BestRouteStrategy::new()));
        choice.install(MULTICAST_STRATEGY_NAME, || Box::new(MulticastStrategy::new()));
        choice
    }

    // Makes a strategy available under `name`, replacing any previous one
    pub fn install<F>(&mut self, name: &str, factory: F)
    where
        F: Fn() -> Box<dyn Strategy> + 'static,
    {
        self.factories.retain(|(n, _)| n != name);
        self.factories.push((name.to_string(), Box::new(factory)));
    }

    pub fn has_strategy(&self, name: &str) -> bool {
        self.factories.iter().any(|(n, _)| n == name)
    }

    pub fn set(&mut self, prefix: &Name, strategy_name: &str) -> Result<(), Error> {
        let factory = self
            .factories
            .iter()
            .find(|(n, _)| n == strategy_name)
            .map(|(_, f)| f)
            .ok_or_else(|| Error::UnknownStrategy(strategy_name.to_string()))?;
        let strategy = factory();
        debug!("strategy-choice prefix={} strategy={}", prefix, strategy_name);

        if prefix.is_empty() {
            self.root = strategy;
        } else {
            self.entries.insert(prefix.clone(), strategy);
        }
        Ok(())
    }

    // The root choice cannot be removed
    pub fn unset(&mut self, prefix: &Name) -> bool {
        self.entries.remove(prefix).is_some()
    }

    // The name of the strategy chosen exactly at `prefix`
    pub fn get(&self, prefix: &Name) -> Option<&str> {
        if prefix.is_empty() {
            return Some(self.root.name());
        }
        self.entries.get(prefix).map(|s| s.name())
    }

    pub fn find_effective_strategy(&mut self, name: &Name) -> &mut dyn Strategy {
        let depth = (1..=name.component_count())
            .rev()
            .find(|count| self.entries.contains_key(&name.prefix(*count)));
        match depth.and_then(|count| self.entries.get_mut(&name.prefix(count))) {
            Some(strategy) => strategy.as_mut(),
            None => self.root.as_mut(),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len() + 1
    }
}

impl Default for StrategyChoice {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::StrategyChoice;
    use crate::{
        error::Error,
        name::Name,
        strategy::BestRouteStrategy,
    };

    fn name(s: &str) -> Name {
        s.parse().unwrap()
    }

    #[test]
    fn test_longest_prefix() {
        let mut choice = StrategyChoice::new();
        choice.set(&name("/a"), "multicast").unwrap();
        choice.set(&name("/a/b/c"), "best-route").unwrap();

        assert_eq!(choice.find_effective_strategy(&name("/x")).name(), "best-route");
        assert_eq!(choice.find_effective_strategy(&name("/a/b")).name(), "multicast");
        assert_eq!(
            choice.find_effective_strategy(&name("/a/b/c/d")).name(),
            "best-route"
        );

        assert!(choice.unset(&name("/a")));
        assert!(!choice.unset(&Name::new()));
        assert_eq!(choice.find_effective_strategy(&name("/a/b")).name(), "best-route");
        assert_eq!(choice.get(&name("/a/b/c")), Some("best-route"));
        assert_eq!(choice.len(), 2);
    }

    #[test]
    fn test_root_and_unknown() {
        let mut choice = StrategyChoice::new();
        choice.set(&Name::new(), "multicast").unwrap();
        assert_eq!(choice.find_effective_strategy(&name("/q")).name(), "multicast");

        assert_eq!(
            choice.set(&name("/a"), "nope"),
            Err(Error::UnknownStrategy("nope".to_string()))
        );

        choice.install("custom", || Box::new(BestRouteStrategy::new()));
        assert!(choice.has_strategy("custom"));
        assert!(choice.set(&name("/a"), "custom").is_ok());
    }
}
