//! Adult census income: predict whether income exceeds 50K

use super::{defaults, num, text, DatasetDescriptor, DemoExample};
use crate::data::{FieldKind, Schema};
use crate::error::Result;
use crate::preprocessing::{EncodingPipeline, LabelRule, RangePolicy};
use std::sync::Arc;

const CATEGORICAL: &[&str] = &[
    "workclass",
    "education",
    "marital_status",
    "occupation",
    "relationship",
    "race",
    "sex",
    "native_country",
];

fn schema() -> Result<Schema> {
    Schema::builder()
        .numeric("age")
        .categorical("workclass")
        .numeric("fnlwgt")
        .categorical("education")
        .numeric("education_num")
        .categorical("marital_status")
        .categorical("occupation")
        .categorical("relationship")
        .categorical("race")
        .categorical("sex")
        .numeric("capital_gain")
        .numeric("capital_loss")
        .numeric("hours_per_week")
        .categorical("native_country")
        .target(FieldKind::Categorical, "income")
        .build()
}

fn pipeline(policy: RangePolicy) -> EncodingPipeline {
    let mut pipeline = EncodingPipeline::new(LabelRule::equals(">50K"))
        .min_max("age", policy)
        .min_max("education_num", policy)
        .min_max("hours_per_week", policy)
        .pass_through("capital_gain")
        .pass_through("capital_loss");
    for field in CATEGORICAL {
        pipeline = pipeline.one_hot(field);
    }

    let order: Vec<&str> = [
        "age",
        "education_num",
        "hours_per_week",
        "capital_gain",
        "capital_loss",
    ]
    .iter()
    .chain(CATEGORICAL)
    .copied()
    .collect();
    pipeline.concat(&order)
}

pub(super) fn descriptor() -> Result<DatasetDescriptor> {
    Ok(DatasetDescriptor {
        name: "income".to_string(),
        title: "Income forecasting based on demographic data".to_string(),
        schema: Arc::new(schema()?),
        defaults: defaults(vec![
            ("relationship", text("Unknown")),
            ("race", text("Unknown")),
            ("native_country", text("United-States")),
        ]),
        examples: vec![
            DemoExample::new(
                "High-earning professional",
                vec![
                    ("age", num(45.0)),
                    ("workclass", text("Private")),
                    ("education", text("Bachelors")),
                    ("education_num", num(13.0)),
                    ("marital_status", text("Married-civ-spouse")),
                    ("occupation", text("Exec-managerial")),
                    ("relationship", text("Husband")),
                    ("race", text("White")),
                    ("sex", text("Male")),
                    ("capital_gain", num(15000.0)),
                    ("capital_loss", num(0.0)),
                    ("hours_per_week", num(60.0)),
                    ("native_country", text("United-States")),
                ],
            ),
            DemoExample::new(
                "Low-earning worker",
                vec![
                    ("age", num(25.0)),
                    ("workclass", text("Private")),
                    ("education", text("HS-grad")),
                    ("education_num", num(9.0)),
                    ("marital_status", text("Never-married")),
                    ("occupation", text("Service")),
                    ("relationship", text("Not-in-family")),
                    ("race", text("Black")),
                    ("sex", text("Female")),
                    ("capital_gain", num(0.0)),
                    ("capital_loss", num(0.0)),
                    ("hours_per_week", num(35.0)),
                    ("native_country", text("United-States")),
                ],
            ),
        ],
        positive_name: ">50K".to_string(),
        negative_name: "<=50K".to_string(),
        pipeline,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_has_fifteen_columns() {
        let schema = schema().unwrap();
        assert_eq!(schema.column_count(), 15);
        assert_eq!(schema.target().name, "income");
    }
}
