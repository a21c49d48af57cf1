//! Utility functions for the container
//!
//! Naming helpers used for bean-name conventions and static dependency graph checks.

/// Naming convention utilities for bean names
pub mod naming {
    /// Converts a PascalCase type name to camelCase for bean naming.
    ///
    /// This is the conventional bean name for a type, so a `UserService`
    /// dependency is looked up as `userService` when neither a parameter name
    /// nor a unique type match resolves it.
    ///
    /// # Examples
    ///
    /// ```
    /// use beanstalk_core::utils::naming::to_camel_case;
    ///
    /// assert_eq!(to_camel_case("UserService"), "userService");
    /// assert_eq!(to_camel_case("DatabaseConnectionPool"), "databaseConnectionPool");
    /// assert_eq!(to_camel_case("A"), "a");
    /// assert_eq!(to_camel_case(""), "");
    /// ```
    pub fn to_camel_case(s: &str) -> String {
        let mut chars = s.chars();
        match chars.next() {
            None => String::new(),
            Some(first) => {
                let mut result = String::with_capacity(s.len());
                result.extend(first.to_lowercase());
                result.push_str(chars.as_str());
                result
            }
        }
    }

    /// Reduces a full `std::any::type_name` to the simple type name.
    ///
    /// Module paths, generic arguments, `dyn` and auto-trait bounds are dropped.
    ///
    /// ```
    /// use beanstalk_core::utils::naming::simple_type_name;
    ///
    /// assert_eq!(simple_type_name("app::service::UserService"), "UserService");
    /// assert_eq!(simple_type_name("dyn app::Greeter + Send + Sync"), "Greeter");
    /// assert_eq!(simple_type_name("alloc::vec::Vec<app::User>"), "Vec");
    /// ```
    pub fn simple_type_name(full: &'static str) -> &'static str {
        let trimmed = full.strip_prefix("dyn ").unwrap_or(full);
        let base = trimmed.split('<').next().unwrap_or(trimmed);
        let base = base.split(" + ").next().unwrap_or(base).trim();
        match base.rfind("::") {
            Some(idx) => &base[idx + 2..],
            None => base,
        }
    }
}

/// Dependency graph utilities
pub mod dependency {
    use std::collections::{HashMap, HashSet};

    /// Dependency graph analysis result
    #[derive(Debug)]
    pub enum DependencyValidationError {
        /// Circular dependency detected
        CircularDependency {
            /// The dependency chain forming the cycle
            cycle: Vec<String>,
        },
        /// Missing dependency detected
        MissingDependency {
            /// The bean that requires the dependency
            bean: String,
            /// The missing dependency
            missing: String,
        },
    }

    impl std::fmt::Display for DependencyValidationError {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            match self {
                Self::CircularDependency { cycle } => {
                    write!(f, "Circular dependency detected: {}", cycle.join(" -> "))
                }
                Self::MissingDependency { bean, missing } => {
                    write!(f, "Bean '{}' depends on '{}' which is not registered", bean, missing)
                }
            }
        }
    }

    /// Validates a hard-dependency graph for cycles and missing beans.
    ///
    /// Only edges that cannot be satisfied by an early reference belong in
    /// this graph (constructor arguments and `depends_on`); setter references
    /// are allowed to form cycles.
    ///
    /// Nodes are visited in sorted order so the reported cycle is stable.
    pub fn validate_dependency_graph(
        dependencies: &HashMap<String, Vec<String>>,
    ) -> Result<(), DependencyValidationError> {
        let mut names: Vec<&String> = dependencies.keys().collect();
        names.sort();

        for bean_name in &names {
            for dep in &dependencies[*bean_name] {
                if !dependencies.contains_key(dep) {
                    return Err(DependencyValidationError::MissingDependency {
                        bean: (*bean_name).clone(),
                        missing: dep.clone(),
                    });
                }
            }
        }

        let mut visited = HashSet::new();
        let mut rec_stack = Vec::new();

        for bean_name in names {
            if !visited.contains(bean_name.as_str()) {
                if let Some(cycle) =
                    detect_cycle_dfs(bean_name, dependencies, &mut visited, &mut rec_stack)
                {
                    return Err(DependencyValidationError::CircularDependency { cycle });
                }
            }
        }

        Ok(())
    }

    /// DFS-based cycle detection
    ///
    /// Returns Some(cycle) if a cycle is detected, None otherwise
    fn detect_cycle_dfs(
        node: &str,
        graph: &HashMap<String, Vec<String>>,
        visited: &mut HashSet<String>,
        rec_stack: &mut Vec<String>,
    ) -> Option<Vec<String>> {
        visited.insert(node.to_string());
        rec_stack.push(node.to_string());

        if let Some(deps) = graph.get(node) {
            for dep in deps {
                if let Some(start_idx) = rec_stack.iter().position(|x| x == dep) {
                    let mut cycle = rec_stack[start_idx..].to_vec();
                    cycle.push(dep.to_string());
                    return Some(cycle);
                }
                if !visited.contains(dep) {
                    if let Some(cycle) = detect_cycle_dfs(dep, graph, visited, rec_stack) {
                        return Some(cycle);
                    }
                }
            }
        }

        rec_stack.pop();
        None
    }
}
