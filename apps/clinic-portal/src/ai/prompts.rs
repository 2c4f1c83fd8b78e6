//! Modelos de prompt enviados ao upstream
//!
//! O conteúdo é fixo; só o dado do usuário é interpolado. As respostas voltam
//! em Markdown e são repassadas como chegaram.

/// Resumo clínico de um medicamento, voltado a farmacêuticos
pub fn drug_information(drug_name: &str) -> String {
    format!(
        "Provide a brief clinical summary for pharmacists on the drug **{}** in Markdown format:\n\
         ## Therapeutic Uses\n\
         - List primary therapeutic uses\n\
         ## Standard Dosage\n\
         - Provide standard adult dosage (include administration route and frequency)\n\
         ## Common Side Effects\n\
         - List common side effects\n\
         ## Serious Side Effects\n\
         - List serious side effects requiring immediate attention\n\
         ## Contraindications\n\
         - List conditions or scenarios where the drug should not be used\n\
         ## Important Drug Interactions\n\
         - List significant drug interactions\n\
         Use concise bullet points. Ensure clarity and professional tone.",
        drug_name
    )
}

/// Predição de doenças prováveis a partir de sintomas combinados
pub fn disease_prediction(symptoms: &str) -> String {
    format!(
        "You are a medical assistant. Given the following symptoms: **{}**, perform a \
         comprehensive analysis to predict the most likely diseases or conditions.\n\
         ### Possible Diseases\n\
         - List the top 3-5 potential diseases or conditions that match the combined symptom profile.\n\
         - Prioritize common, serious, and high-likelihood conditions.\n\
         ### Description\n\
         - For each predicted disease, provide a 1-2 sentence explanation of how the listed symptoms relate to it.\n\
         ### Symptom-wise Breakdown\n\
         For each symptom, provide:\n\
         - **Symptom:** [Symptom name]\n\
         - **Possible Disease:** [Likely associated disease]\n\
         - **Explanation:** [Brief explanation of the relationship]\n\
         ### When to Seek Immediate Medical Attention\n\
         - Highlight any symptoms or combinations that may indicate a medical emergency.\n\
         Use Markdown formatting. Avoid general disclaimers. Do not repeat the same disease \
         unless strongly justified.",
        symptoms
    )
}

/// Recomendação de tratamentos de venda livre para os sintomas
pub fn symptom_recommendation(symptoms: &str) -> String {
    format!(
        "Given the symptoms: **{}**, recommend over-the-counter treatment options in Markdown format:\n\
         ## Recommended Over-the-Counter Treatments\n\
         - List appropriate OTC medications or treatments\n\
         ## Common Side Effects\n\
         - List common side effects of recommended treatments\n\
         ## Important Interactions\n\
         - List significant drug or condition interactions\n\
         ## Safety Tips\n\
         - Provide key safety tips or precautions\n\
         If symptoms suggest a medical emergency or severe condition, clearly state: \
         **'Seek immediate medical attention.'** \
         Use concise bullet points in Markdown format. Avoid disclaimers.",
        symptoms
    )
}

/// Conferência de medicamentos contra alergias declaradas
pub fn allergy_check(allergies: &str, medicines: &str) -> String {
    format!(
        "You are an AI medical assistant.\n\
         Check the following medicines against these allergies:\n\n\
         Allergies: {}\n\
         Medicines: {}\n\n\
         Provide:\n\
         - Whether each medicine is safe\n\
         - Possible allergic reactions or warnings\n\
         Answer in bullet points.",
        allergies, medicines
    )
}

/// Análise de foto de embalagem de medicamento
pub fn medicine_image_analysis() -> &'static str {
    "Analyze this image of a medicine or drug packaging. Provide the response in Markdown format:\n\
     ## Drug Information\n\
     - **Drug Name**: Identify the drug name (if visible)\n\
     - **Manufacturer**: Identify the manufacturer (if visible)\n\
     ## Clinical Summary\n\
     - **Therapeutic Uses**: List primary uses\n\
     - **Standard Dosage**: Provide standard dosage\n\
     - **Common Side Effects**: List common side effects\n\
     - **Serious Side Effects**: List serious side effects\n\
     - **Contraindications**: List contraindications\n\
     - **Important Interactions**: List significant interactions\n\
     If the image is blurry or unclear, respond with: \
     **'Please retake the image for better clarity.'**"
}

/// Extração e validação de uma foto de receita
pub fn prescription_validation() -> &'static str {
    "You are a medical assistant AI.\n\
     Given an image of a *prescription*, extract and analyze:\n\n\
     ### Step 1: Extract Prescription Details\n\
     - List all *medications/drugs* mentioned.\n\
     - Include *dosage*, *frequency*, and *duration* if visible.\n\n\
     ### Step 2: Validation\n\
     - Check for *duplicate drugs* or overlapping medicines.\n\
     - Check for *drug-drug interactions*.\n\
     - Flag any *potentially harmful combinations*.\n\
     - If dosage looks too high or low, *flag it*.\n\n\
     ### Output Format (Markdown)\n\
     ## Extracted Prescription\n\
     - Drug 1: [Name], [Dosage], [Frequency], [Duration]\n\
     - ...\n\n\
     ## AI-Powered Feedback\n\
     - Safety Warnings:\n\
     - Interaction Notes:\n\
     - Suggestions:\n\n\
     If the image is unclear or handwriting is illegible, reply with:\n\
     'The prescription image is too unclear to read. Please retake it in good lighting.'"
}
