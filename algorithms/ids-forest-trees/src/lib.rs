//!
//! # Tree ensembles
//! `ids-forest-trees` provides CART decision trees and the random forest classifier built on top
//! of them.
//!
//! # The big picture
//!
//! Decision Trees (DTs) are a non-parametric supervised learning method used for classification.
//! The goal is to create a model that predicts the value of a target variable by learning simple
//! decision rules inferred from the data features. A random forest grows many such trees, each on
//! a bootstrap sample of the training data and with a random subset of candidate features in
//! every node, and averages their class distributions.
//!
//! # Current state
//!
//! * a [decision tree](DecisionTree) with Gini or entropy splits and weighted samples
//! * a [random forest](RandomForestClassifier) with bootstrapping, balanced class weights and
//!   mean-decrease-in-impurity feature importances, trees are fitted in parallel
//!

mod decision_trees;
mod random_forest;

pub use decision_trees::*;
pub use random_forest::*;

pub use ids_forest::error::Result;
