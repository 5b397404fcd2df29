mod prop_fold;
mod prop_relations;
